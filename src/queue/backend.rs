//! Backend trait for queue file operations

use super::error::QueueError;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Abstraction over filesystem operations so the store can run on disk or in memory
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Read entire file contents
    async fn read_file(&self, path: &Path) -> Result<Bytes, QueueError>;

    /// Write file contents atomically and durably (temp file + fsync + rename)
    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), QueueError>;

    /// Delete a file; deleting a missing file is not an error
    async fn delete_file(&self, path: &Path) -> Result<(), QueueError>;

    /// Create directory and all parent directories
    async fn create_dir_all(&self, path: &Path) -> Result<(), QueueError>;

    /// List all files in a directory
    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, QueueError>;

    async fn exists(&self, path: &Path) -> Result<bool, QueueError>;
}
