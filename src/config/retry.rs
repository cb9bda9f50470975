//! Replay retry configuration.
//!
//! YAML form of the replay policy applied to queued writes that fail to
//! reach the network. With no settings, every trigger replays every entry
//! (unlimited attempts, no backoff).

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS};

fn default_initial_backoff_ms() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

fn default_max_backoff_ms() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

/// Retry configuration (YAML format)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetryConfigYaml {
    /// Maximum replay attempts per entry; absent means unlimited
    #[serde(default)]
    pub max_attempts: Option<u32>,
    /// Delay after the first failure in milliseconds (0 disables backoff)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Cap for the exponential backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfigYaml {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfigYaml {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == Some(0) {
            return Err("sync.retry.max_attempts must be at least 1 when set".to_string());
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(format!(
                "sync.retry.initial_backoff_ms ({}) cannot be greater than max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            ));
        }
        Ok(())
    }

    /// Convert to ReplayPolicy from sync module
    pub fn to_replay_policy(&self) -> crate::sync::ReplayPolicy {
        crate::sync::ReplayPolicy::new(
            self.max_attempts,
            self.initial_backoff_ms,
            self.max_backoff_ms,
        )
    }
}
