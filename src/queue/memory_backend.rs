//! In-memory backend (HashMap storage) with fault injection

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::backend::QueueBackend;
use super::error::QueueError;

/// Backend that keeps files in memory
///
/// Clones share storage, so a fresh `QueueStore` over a clone behaves like a
/// process restart over the same disk.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    files: Arc<RwLock<BTreeMap<PathBuf, Bytes>>>,
    directories: Arc<RwLock<BTreeSet<PathBuf>>>,
    unavailable: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails with `BackendUnavailable`
    pub fn set_unavailable(&self, enabled: bool) {
        self.unavailable.store(enabled, Ordering::SeqCst);
    }

    /// Writes fail with `BackendUnavailable`, reads keep working
    pub fn set_fail_writes(&self, enabled: bool) {
        self.fail_writes.store(enabled, Ordering::SeqCst);
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    fn check(&self) -> Result<(), QueueError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::BackendUnavailable);
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), QueueError> {
        self.check()?;
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(QueueError::BackendUnavailable);
        }
        Ok(())
    }
}

fn not_found(path: &Path) -> QueueError {
    QueueError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("{} not found", path.display()),
    ))
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn read_file(&self, path: &Path) -> Result<Bytes, QueueError> {
        self.check()?;
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    async fn write_file_atomic(&self, path: &Path, data: Bytes) -> Result<(), QueueError> {
        self.check_write()?;
        if let Some(parent) = path.parent() {
            self.directories.write().insert(parent.to_path_buf());
        }
        self.files.write().insert(path.to_path_buf(), data);
        Ok(())
    }

    async fn delete_file(&self, path: &Path) -> Result<(), QueueError> {
        self.check_write()?;
        self.files.write().remove(path);
        Ok(())
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), QueueError> {
        self.check_write()?;
        self.directories.write().insert(path.to_path_buf());
        Ok(())
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>, QueueError> {
        self.check()?;
        if !self.directories.read().contains(path) {
            return Err(not_found(path));
        }
        Ok(self
            .files
            .read()
            .keys()
            .filter(|p| p.parent() == Some(path))
            .cloned()
            .collect())
    }

    async fn exists(&self, path: &Path) -> Result<bool, QueueError> {
        self.check()?;
        Ok(self.files.read().contains_key(path) || self.directories.read().contains(path))
    }
}
