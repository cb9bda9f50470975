//! Background sync: replay of writes queued while offline

mod coordinator;
mod policy;

pub use coordinator::{SyncCoordinator, SyncOutcome, SyncReport, SyncTrigger};
pub use policy::{ReplayDecision, ReplayPolicy};

use thiserror::Error;

use crate::queue::QueueError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Queue store failed during sync: {0}")]
    Queue(#[from] QueueError),
}
