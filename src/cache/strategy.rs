//! Cache strategy engine
//!
//! Both strategies read and write the single current cache generation.
//!
//! **Network-first** (cacheable API reads): live answer preferred; a copy of
//! every 2xx response is stored. On transport failure the cached copy is
//! served, or a synthesized 503 when there is none.
//!
//! **Cache-first** (static assets, documents): a hit is returned at once and
//! refreshed in the background; refresh failures never reach the caller. A
//! miss goes to the network; a failed navigation falls back to the cached
//! offline document.
//!
//! Writes are full overwrites, so concurrent refreshes of one key are
//! last-write-wins without corruption.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;

use super::entry::{CacheEntry, CacheKey};
use super::traits::{Cache, CacheStorage};
use crate::http::{Network, NetworkError, Request, Response};
use crate::metrics::WorkerMetrics;
use crate::router::ApiMatcher;

/// Handle on the current generation
///
/// The generation is looked up per operation; a missing generation degrades
/// to a miss (reads) or a skipped write, never to an error for the caller.
#[derive(Clone)]
pub struct Generation {
    storage: Arc<dyn CacheStorage>,
    name: String,
}

impl Generation {
    pub fn new(storage: Arc<dyn CacheStorage>, name: impl Into<String>) -> Self {
        Self {
            storage,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Only install creates a generation; a missing one (never installed,
    /// or evicted by a newer version) reads as a miss
    async fn open(&self) -> Option<Arc<dyn Cache>> {
        let cache = self.storage.get(&self.name).await;
        if cache.is_none() {
            tracing::debug!(generation = %self.name, "Cache generation not present");
        }
        cache
    }

    pub async fn lookup(&self, key: &CacheKey) -> Option<Response> {
        let cache = self.open().await?;
        match cache.get(key).await {
            Ok(entry) => entry.map(|e| e.response),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Store a copy of a response; only GET + 2xx are written
    pub async fn store(&self, key: CacheKey, response: &Response) -> bool {
        if !key.is_get() || !response.is_ok() {
            return false;
        }
        let Some(cache) = self.open().await else {
            return false;
        };
        match cache.put(key.clone(), CacheEntry::new(response.clone())).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache write failed");
                false
            }
        }
    }
}

pub struct StrategyEngine {
    generation: Generation,
    network: Arc<dyn Network>,
    matcher: Arc<ApiMatcher>,
    offline_page: CacheKey,
    refreshes: Mutex<JoinSet<()>>,
}

impl StrategyEngine {
    pub fn new(
        generation: Generation,
        network: Arc<dyn Network>,
        matcher: Arc<ApiMatcher>,
        offline_page: impl Into<String>,
    ) -> Self {
        Self {
            generation,
            network,
            matcher,
            offline_page: CacheKey::get(offline_page),
            refreshes: Mutex::new(JoinSet::new()),
        }
    }

    pub fn generation(&self) -> &Generation {
        &self.generation
    }

    /// Network-first read. Never fails: stale copy or 503 on transport failure.
    pub async fn network_first(&self, request: &Request) -> Response {
        let metrics = WorkerMetrics::global();
        let key = CacheKey::from_request(request);

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() && self.matcher.is_match(&request.path()) {
                    self.generation.store(key, &response).await;
                }
                metrics.record_lookup("network_first", "network");
                response
            }
            Err(err) => match self.generation.lookup(&key).await {
                Some(cached) => {
                    tracing::info!(url = %request.url, error = %err, "Network failed, serving cached response");
                    metrics.record_lookup("network_first", "stale");
                    cached
                }
                None => {
                    tracing::info!(url = %request.url, error = %err, "Network failed with no cached copy, serving offline fallback");
                    metrics.record_lookup("network_first", "fallback");
                    Response::offline_fallback()
                }
            },
        }
    }

    /// Cache-first read. Fails only on a miss whose network fetch fails and
    /// that has no offline document to fall back to.
    pub async fn cache_first(&self, request: &Request) -> Result<Response, NetworkError> {
        let metrics = WorkerMetrics::global();
        let key = CacheKey::from_request(request);

        if let Some(cached) = self.generation.lookup(&key).await {
            metrics.record_lookup("cache_first", "hit");
            self.spawn_refresh(request.clone(), key);
            return Ok(cached);
        }

        metrics.record_lookup("cache_first", "miss");
        match self.network.fetch(request).await {
            Ok(response) => {
                self.generation.store(key, &response).await;
                Ok(response)
            }
            Err(err) => {
                if request.is_navigation() {
                    if let Some(offline) = self.generation.lookup(&self.offline_page).await {
                        tracing::info!(url = %request.url, error = %err, "Navigation failed, serving offline document");
                        metrics.record_lookup("cache_first", "offline_document");
                        return Ok(offline);
                    }
                }
                tracing::debug!(url = %request.url, error = %err, "Cache miss and network failure");
                Err(err)
            }
        }
    }

    /// Fire-and-forget refresh of a cache hit
    fn spawn_refresh(&self, request: Request, key: CacheKey) {
        let network = self.network.clone();
        let generation = self.generation.clone();

        let mut refreshes = self.refreshes.lock();
        // Reap refreshes that already finished
        while refreshes.try_join_next().is_some() {}

        refreshes.spawn(async move {
            let metrics = WorkerMetrics::global();
            match network.fetch(&request).await {
                Ok(response) => {
                    if generation.store(key, &response).await {
                        metrics.record_refresh("stored");
                    } else {
                        metrics.record_refresh("skipped");
                    }
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "Background refresh failed");
                    metrics.record_refresh("failed");
                }
            }
        });
    }

    /// Wait for every in-flight background refresh to finish
    pub async fn settle(&self) {
        let mut pending = std::mem::take(&mut *self.refreshes.lock());
        while pending.join_next().await.is_some() {}
    }
}
