// Error types module

use thiserror::Error;

use crate::cache::CacheError;
use crate::http::NetworkError;
use crate::lifecycle::LifecycleError;
use crate::queue::QueueError;
use crate::sync::SyncError;

/// Centralized error type for the worker
///
/// Only construction and lifecycle surface these; request interception
/// degrades to cached, queued or synthesized responses instead of failing.
#[derive(Error, Debug)]
pub enum HikyakuError {
    /// Configuration errors (invalid YAML, missing env vars, bad values)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, HikyakuError>;
