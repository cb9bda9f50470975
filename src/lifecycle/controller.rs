use futures::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use super::clients::ClientRegistry;
use super::{LifecycleError, WorkerState};
use crate::cache::{Cache, CacheEntry, CacheKey, CacheStorage};
use crate::http::{Network, Request};

/// Result of precaching the install manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    /// Generations deleted because they are not the current one
    pub evicted: Vec<String>,
    /// Clients newly taken under control
    pub claimed: usize,
}

/// Drives install and activate for one worker version
pub struct LifecycleController {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    clients: Arc<ClientRegistry>,
    generation: String,
    precache: Vec<String>,
    state: RwLock<WorkerState>,
}

impl LifecycleController {
    pub fn new(
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        clients: Arc<ClientRegistry>,
        generation: impl Into<String>,
        precache: Vec<String>,
    ) -> Self {
        Self {
            storage,
            network,
            clients,
            generation: generation.into(),
            precache,
            state: RwLock::new(WorkerState::Parsed),
        }
    }

    /// Current state; an activated worker whose generation is no longer the
    /// storage's current one turns redundant here
    pub fn state(&self) -> WorkerState {
        let state = *self.state.read();
        if state == WorkerState::Activated && self.is_superseded() {
            self.retire();
            return WorkerState::Redundant;
        }
        state
    }

    fn is_superseded(&self) -> bool {
        self.storage.current().as_deref() != Some(self.generation.as_str())
    }

    pub fn is_active(&self) -> bool {
        self.state() == WorkerState::Activated
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    fn transition(
        &self,
        operation: &'static str,
        from: WorkerState,
        to: WorkerState,
    ) -> Result<(), LifecycleError> {
        let mut state = self.state.write();
        if *state != from {
            return Err(LifecycleError::InvalidState {
                operation,
                state: *state,
            });
        }
        *state = to;
        tracing::debug!(generation = %self.generation, from = %from, to = %to, "Worker state changed");
        Ok(())
    }

    /// Open the current generation and precache the manifest
    ///
    /// Each manifest entry is fetched and stored on its own; a failing entry
    /// is logged and skipped. Install always completes once the generation
    /// step is done.
    pub async fn install(&self) -> Result<InstallReport, LifecycleError> {
        self.transition("install", WorkerState::Parsed, WorkerState::Installing)?;
        let start = Instant::now();

        let report = match self.storage.open(&self.generation).await {
            Ok(cache) => self.precache_into(cache).await,
            Err(e) => {
                tracing::warn!(
                    generation = %self.generation,
                    error = %e,
                    "Failed to open cache generation, installing without precache"
                );
                InstallReport {
                    cached: Vec::new(),
                    failed: self.precache.clone(),
                }
            }
        };

        self.transition("install", WorkerState::Installing, WorkerState::Installed)?;

        tracing::info!(
            generation = %self.generation,
            cached = report.cached.len(),
            failed = report.failed.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Worker installed"
        );
        Ok(report)
    }

    async fn precache_into(&self, cache: Arc<dyn Cache>) -> InstallReport {
        let fetches = self.precache.iter().map(|url| {
            let cache = cache.clone();
            async move {
                let request = Request::get(url.as_str());
                let response = match self.network.fetch(&request).await {
                    Ok(response) if response.is_ok() => response,
                    Ok(response) => {
                        tracing::warn!(url = %url, status = response.status.as_u16(), "Precache fetch returned error status");
                        return (url.clone(), false);
                    }
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Precache fetch failed");
                        return (url.clone(), false);
                    }
                };
                match cache
                    .put(CacheKey::get(url.as_str()), CacheEntry::new(response))
                    .await
                {
                    Ok(()) => (url.clone(), true),
                    Err(e) => {
                        tracing::warn!(url = %url, error = %e, "Precache store failed");
                        (url.clone(), false)
                    }
                }
            }
        });

        let mut report = InstallReport::default();
        for (url, cached) in join_all(fetches).await {
            if cached {
                report.cached.push(url);
            } else {
                report.failed.push(url);
            }
        }
        report
    }

    /// Mark this generation current, evict every other one, then claim all
    /// clients
    ///
    /// Any older worker sharing the storage sees the marker move and turns
    /// redundant on its next state check.
    pub async fn activate(&self) -> Result<ActivateReport, LifecycleError> {
        self.transition("activate", WorkerState::Installed, WorkerState::Activating)?;
        self.storage.set_current(&self.generation);

        let mut report = ActivateReport::default();
        match self.storage.keys().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| *n != self.generation) {
                    match self.storage.delete(&name).await {
                        Ok(_) => {
                            tracing::info!(generation = %name, "Evicted stale cache generation");
                            report.evicted.push(name);
                        }
                        Err(e) => {
                            tracing::warn!(generation = %name, error = %e, "Failed to evict cache generation");
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list cache generations, skipping eviction");
            }
        }

        report.claimed = self.clients.claim();
        self.transition("activate", WorkerState::Activating, WorkerState::Activated)?;

        tracing::info!(
            generation = %self.generation,
            evicted = report.evicted.len(),
            claimed = report.claimed,
            "Worker activated"
        );
        Ok(report)
    }

    /// Mark this version as superseded; it stops intercepting
    pub fn retire(&self) {
        let mut state = self.state.write();
        if *state != WorkerState::Redundant {
            tracing::info!(generation = %self.generation, from = %*state, "Worker retired");
            *state = WorkerState::Redundant;
        }
    }
}
