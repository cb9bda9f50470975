//! Durable queue of writes deferred while offline
//!
//! Records survive restarts of the worker process. Two backends:
//! - **tokio::fs backend**: files on disk (production)
//! - **memory backend**: in-process storage with fault injection

pub mod backend;
mod error;
mod memory_backend;
mod record;
mod store;
mod tokio_backend;

pub use self::backend::QueueBackend;
pub use self::error::QueueError;
pub use self::memory_backend::MemoryBackend;
pub use self::record::QueuedRequest;
pub use self::store::QueueStore;
pub use self::tokio_backend::TokioFsBackend;

pub(crate) use self::store::now_millis;
