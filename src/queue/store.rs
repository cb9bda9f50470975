//! Durable queue store
//!
//! Layout under `<dir>/<store_name>/`:
//! - `schema.json`: written when the store is first provisioned
//! - `<id>.json`: one record per queued request, zero-padded so that a
//!   directory listing sorts in id order
//!
//! Every mutation runs under one async lock; record files are replaced
//! atomically so readers never observe a partial record.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

use super::backend::QueueBackend;
use super::error::QueueError;
use super::record::QueuedRequest;
use crate::constants::QUEUE_SCHEMA_VERSION;
use crate::http::Request;

const SCHEMA_FILE: &str = "schema.json";
const RECORD_EXTENSION: &str = "json";

/// Store descriptor written at provisioning time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct StoreSchema {
    name: String,
    version: u32,
    key_path: String,
}

#[derive(Debug, Default)]
struct StoreState {
    provisioned: bool,
    /// Highest id handed out or found on disk; None until first loaded
    last_id: Option<u64>,
}

pub struct QueueStore {
    backend: Arc<dyn QueueBackend>,
    root: PathBuf,
    name: String,
    state: Mutex<StoreState>,
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn now_micros() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

impl QueueStore {
    pub fn new(backend: Arc<dyn QueueBackend>, dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            backend,
            root: dir.as_ref().join(name),
            name: name.to_string(),
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn schema_path(&self) -> PathBuf {
        self.root.join(SCHEMA_FILE)
    }

    fn record_path(&self, id: u64) -> PathBuf {
        self.root.join(format!("{:020}.{}", id, RECORD_EXTENSION))
    }

    /// Capture a request durably; returns once the record is committed
    pub async fn enqueue(&self, request: &Request) -> Result<QueuedRequest, QueueError> {
        let mut state = self.state.lock().await;
        self.ensure_provisioned(&mut state).await?;

        let last_id = match state.last_id {
            Some(id) => id,
            None => self.highest_persisted_id().await?,
        };
        // Microsecond clock, bumped past anything already issued
        let id = now_micros().max(last_id + 1);

        let record = QueuedRequest::from_request(id, request, now_millis());
        self.write_record(&record).await?;
        state.last_id = Some(id);

        tracing::info!(
            store = %self.name,
            id,
            method = %record.method,
            url = %record.url,
            "Request queued for replay"
        );
        Ok(record)
    }

    /// Every queued entry, sorted by id (enqueue order)
    pub async fn drain_all(&self) -> Result<Vec<QueuedRequest>, QueueError> {
        if !self.backend.exists(&self.root).await? {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for path in self.record_paths().await? {
            let data = match self.backend.read_file(&path).await {
                Ok(data) => data,
                // Removed between listing and reading
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            match serde_json::from_slice::<QueuedRequest>(&data) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(
                        store = %self.name,
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable queue record"
                    );
                }
            }
        }
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    /// Delete one entry; removing an absent entry is not an error
    pub async fn remove(&self, id: u64) -> Result<(), QueueError> {
        let _state = self.state.lock().await;
        self.backend.delete_file(&self.record_path(id)).await?;
        tracing::debug!(store = %self.name, id, "Queue entry removed");
        Ok(())
    }

    /// Bump the attempt count of an entry after a failed replay
    ///
    /// Returns the updated record, or None if the entry is gone.
    pub async fn record_failure(
        &self,
        id: u64,
        attempted_at: u64,
    ) -> Result<Option<QueuedRequest>, QueueError> {
        let _state = self.state.lock().await;
        let path = self.record_path(id);
        let data = match self.backend.read_file(&path).await {
            Ok(data) => data,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut record: QueuedRequest = serde_json::from_slice(&data)?;
        record.attempts = record.attempts.saturating_add(1);
        record.last_attempt_at = Some(attempted_at);
        self.write_record(&record).await?;
        Ok(Some(record))
    }

    /// Number of queued entries
    pub async fn len(&self) -> Result<usize, QueueError> {
        if !self.backend.exists(&self.root).await? {
            return Ok(0);
        }
        Ok(self.record_paths().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len().await? == 0)
    }

    async fn ensure_provisioned(&self, state: &mut StoreState) -> Result<(), QueueError> {
        if state.provisioned {
            return Ok(());
        }

        let schema_path = self.schema_path();
        if self.backend.exists(&schema_path).await? {
            let data = self.backend.read_file(&schema_path).await?;
            let schema: StoreSchema = serde_json::from_slice(&data)?;
            if schema.version != QUEUE_SCHEMA_VERSION {
                return Err(QueueError::SchemaMismatch {
                    store: self.name.clone(),
                    found: schema.version,
                    expected: QUEUE_SCHEMA_VERSION,
                });
            }
        } else {
            self.backend.create_dir_all(&self.root).await?;
            let schema = StoreSchema {
                name: self.name.clone(),
                version: QUEUE_SCHEMA_VERSION,
                key_path: "id".to_string(),
            };
            let json = serde_json::to_vec_pretty(&schema)?;
            self.backend
                .write_file_atomic(&schema_path, Bytes::from(json))
                .await?;
            tracing::info!(store = %self.name, root = %self.root.display(), "Queue store provisioned");
        }

        state.provisioned = true;
        Ok(())
    }

    async fn record_paths(&self) -> Result<Vec<PathBuf>, QueueError> {
        let mut paths: Vec<PathBuf> = self
            .backend
            .read_dir(&self.root)
            .await?
            .into_iter()
            .filter(|p| {
                p.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
                    && p.file_name().and_then(|n| n.to_str()) != Some(SCHEMA_FILE)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    async fn highest_persisted_id(&self) -> Result<u64, QueueError> {
        Ok(self
            .record_paths()
            .await?
            .iter()
            .filter_map(|p| p.file_stem()?.to_str()?.parse::<u64>().ok())
            .max()
            .unwrap_or(0))
    }

    async fn write_record(&self, record: &QueuedRequest) -> Result<(), QueueError> {
        let json = serde_json::to_vec(record)?;
        self.backend
            .write_file_atomic(&self.record_path(record.id), Bytes::from(json))
            .await
    }
}
