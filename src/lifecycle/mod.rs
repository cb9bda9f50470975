//! Worker lifecycle: install, activate, client control
//!
//! States move strictly forward:
//! `parsed -> installing -> installed -> activating -> activated`, and any
//! state may end in `redundant` once a newer version takes over. Install
//! must finish before activate may start.

mod clients;
mod controller;

pub use clients::{ClientInfo, ClientRegistry};
pub use controller::{ActivateReport, InstallReport, LifecycleController};

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Installed and waiting to activate
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Cannot {operation} while worker is {state}")]
    InvalidState {
        operation: &'static str,
        state: WorkerState,
    },
}
