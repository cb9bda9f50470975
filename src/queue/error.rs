//! Error types for durable queue operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue store '{store}' has schema version {found}, expected {expected}")]
    SchemaMismatch {
        store: String,
        found: u32,
        expected: u32,
    },

    #[error("Invalid queued request {id}: {reason}")]
    InvalidRecord { id: u64, reason: String },

    #[error("Queue backend unavailable")]
    BackendUnavailable,
}

impl QueueError {
    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, QueueError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}
