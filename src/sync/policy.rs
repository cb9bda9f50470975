//! Replay policy for queued writes
//!
//! Decides, per queued entry and per sync cycle, whether the entry is sent
//! now, held back, or left alone for good.
//!
//! ## Backoff
//!
//! After the n-th failed replay an entry waits
//! `initial_backoff_ms * 2^(n-1)`, capped at `max_backoff_ms`, measured from
//! its last failed attempt:
//! - 1 failure: initial_backoff_ms
//! - 2 failures: 2x
//! - 3 failures: 4x
//!
//! `initial_backoff_ms = 0` disables backoff: every trigger replays every
//! entry, which is the default.
//!
//! ## Attempt limit
//!
//! With `max_attempts` set, an entry that has already failed that many
//! times is not replayed again. It stays queued so nothing is lost.
//!
//! ```yaml
//! sync:
//!   retry:
//!     max_attempts: 10
//!     initial_backoff_ms: 1000
//!     max_backoff_ms: 60000
//! ```

use std::time::Duration;

use crate::constants::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS};
use crate::queue::QueuedRequest;

/// What a sync cycle does with one queued entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayDecision {
    Replay,
    /// Still inside its backoff window; milliseconds left
    Backoff(u64),
    /// Attempt limit reached
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPolicy {
    /// Maximum replay attempts per entry; None means unlimited
    pub max_attempts: Option<u32>,
    /// Delay after the first failure in milliseconds
    pub initial_backoff_ms: u64,
    /// Cap for exponential growth in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for ReplayPolicy {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl ReplayPolicy {
    pub fn new(max_attempts: Option<u32>, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    /// Delay owed after `failures` failed attempts (0 failures = no delay)
    pub fn backoff_duration(&self, failures: u32) -> Duration {
        if failures == 0 || self.initial_backoff_ms == 0 {
            return Duration::from_millis(0);
        }

        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(failures - 1))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }

    /// Decide what to do with an entry at wall time `now_ms`
    pub fn decide(&self, entry: &QueuedRequest, now_ms: u64) -> ReplayDecision {
        if let Some(max) = self.max_attempts {
            if entry.attempts >= max {
                return ReplayDecision::Exhausted;
            }
        }

        let Some(last) = entry.last_attempt_at else {
            return ReplayDecision::Replay;
        };
        let wait = self.backoff_duration(entry.attempts).as_millis() as u64;
        let ready_at = last.saturating_add(wait);
        if now_ms < ready_at {
            ReplayDecision::Backoff(ready_at - now_ms)
        } else {
            ReplayDecision::Replay
        }
    }
}
