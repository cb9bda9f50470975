//! The interception layer: every request the application issues enters here
//!
//! Until the worker is activated, requests go straight to the network.
//! Once active, the router picks a path per request:
//! - writes while online pass through untouched
//! - writes while offline are queued and acknowledged with a 202
//! - cacheable API reads go network-first
//! - everything else goes cache-first

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{CacheStats, CacheStorage, Generation, MemoryCacheStorage, StrategyEngine};
use crate::config::Config;
use crate::error::HikyakuError;
use crate::http::{Connectivity, Network, NetworkError, ReqwestNetwork, Request, Response};
use crate::lifecycle::{
    ActivateReport, ClientRegistry, InstallReport, LifecycleController, WorkerState,
};
use crate::metrics::WorkerMetrics;
use crate::queue::{QueueBackend, QueueStore, TokioFsBackend};
use crate::router::{ApiMatcher, Route, Router};
use crate::sync::{SyncCoordinator, SyncError, SyncOutcome, SyncTrigger};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartReport {
    pub install: InstallReport,
    pub activate: ActivateReport,
}

/// Contents of the current generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheSummary {
    pub generation: String,
    pub keys: Vec<String>,
    pub stats: CacheStats,
}

pub struct ServiceWorker {
    config: Config,
    network: Arc<dyn Network>,
    router: Router,
    storage: Arc<dyn CacheStorage>,
    strategies: StrategyEngine,
    store: Arc<QueueStore>,
    sync: SyncCoordinator,
    lifecycle: LifecycleController,
    clients: Arc<ClientRegistry>,
}

impl ServiceWorker {
    pub fn new(
        config: Config,
        network: Arc<dyn Network>,
        connectivity: Arc<dyn Connectivity>,
        storage: Arc<dyn CacheStorage>,
        queue_backend: Arc<dyn QueueBackend>,
    ) -> Result<Self, HikyakuError> {
        config.validate().map_err(HikyakuError::Config)?;

        let matcher = Arc::new(
            ApiMatcher::new(&config.cache.api_patterns)
                .map_err(|e| HikyakuError::Config(format!("cache.api_patterns: {}", e)))?,
        );
        let generation_name = config.cache.current_generation();
        let clients = Arc::new(ClientRegistry::new());

        let router = Router::new(matcher.clone(), connectivity);
        let strategies = StrategyEngine::new(
            Generation::new(storage.clone(), generation_name.clone()),
            network.clone(),
            matcher,
            config.cache.offline_page.clone(),
        );
        let store = Arc::new(QueueStore::new(
            queue_backend,
            &config.queue.dir,
            &config.queue.store_name,
        ));
        let sync = SyncCoordinator::from_config(&config.sync, store.clone(), network.clone());
        let lifecycle = LifecycleController::new(
            storage.clone(),
            network.clone(),
            clients.clone(),
            generation_name,
            config.cache.precache.clone(),
        );

        Ok(Self {
            config,
            network,
            router,
            storage,
            strategies,
            store,
            sync,
            lifecycle,
            clients,
        })
    }

    /// Production wiring: reqwest network, in-memory cache generations and
    /// the on-disk queue
    pub fn from_config(
        config: Config,
        connectivity: Arc<dyn Connectivity>,
    ) -> Result<Self, HikyakuError> {
        let network = Arc::new(ReqwestNetwork::from_config(&config.network)?);
        let storage = Arc::new(MemoryCacheStorage::new(config.cache.max_cache_size_bytes()));
        Self::new(
            config,
            network,
            connectivity,
            storage,
            Arc::new(TokioFsBackend::new()),
        )
    }

    /// Install then activate
    pub async fn start(&self) -> Result<StartReport, HikyakuError> {
        let install = self.lifecycle.install().await?;
        let activate = self.lifecycle.activate().await?;
        Ok(StartReport { install, activate })
    }

    /// Intercept one request
    ///
    /// Offline conditions never produce an error here except for a
    /// cache-first miss that is not a navigation, which has nothing to fall
    /// back to.
    pub async fn handle_fetch(&self, request: Request) -> Result<Response, NetworkError> {
        if !self.lifecycle.is_active() {
            return self.network.fetch(&request).await;
        }

        let route = self.router.classify(&request);
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            route = route.as_str(),
            "Intercepted request"
        );

        match route {
            Route::PassThrough => self.network.fetch(&request).await,
            Route::QueueOffline => self.queue_offline(&request).await,
            Route::NetworkFirst => Ok(self.strategies.network_first(&request).await),
            Route::CacheFirst => self.strategies.cache_first(&request).await,
        }
    }

    async fn queue_offline(&self, request: &Request) -> Result<Response, NetworkError> {
        match self.store.enqueue(request).await {
            Ok(_) => {
                let metrics = WorkerMetrics::global();
                metrics.queued_requests.inc();
                match self.store.len().await {
                    Ok(depth) => metrics.queue_depth.set(depth as i64),
                    Err(e) => tracing::warn!(error = %e, "Failed to read queue depth"),
                }
                Ok(Response::queued_ack())
            }
            Err(e) => {
                // Never acknowledge a write that was not stored
                tracing::error!(
                    method = %request.method,
                    url = %request.url,
                    error = %e,
                    "Failed to queue offline write, sending it to the network"
                );
                self.network.fetch(request).await
            }
        }
    }

    /// Platform background-sync event; None when the tag is not ours
    pub async fn handle_sync(&self, tag: &str) -> Option<Result<SyncOutcome, SyncError>> {
        self.sync
            .handle(SyncTrigger::BackgroundSync(tag.to_string()))
            .await
    }

    /// In-process message from an application instance
    pub async fn handle_message(&self, payload: &str) -> Option<Result<SyncOutcome, SyncError>> {
        self.sync
            .handle(SyncTrigger::Message(payload.to_string()))
            .await
    }

    /// Register an open application instance; controlled at once when active
    pub fn connect_client(&self, url: impl Into<String>) -> Uuid {
        self.clients.register(url, self.lifecycle.is_active())
    }

    pub fn disconnect_client(&self, id: &Uuid) -> bool {
        self.clients.unregister(id)
    }

    /// Wait for background refreshes, then stop intercepting
    pub async fn shutdown(&self) {
        self.strategies.settle().await;
        self.lifecycle.retire();
    }

    /// Wait for background cache refreshes started by cache-first hits
    pub async fn settle(&self) {
        self.strategies.settle().await;
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    /// Keys and usage of the current generation; None before install or once
    /// a newer version has evicted it
    pub async fn cache_summary(&self) -> Result<Option<CacheSummary>, HikyakuError> {
        let Some(cache) = self.storage.get(self.generation()).await else {
            return Ok(None);
        };
        cache.run_pending_tasks().await;
        let keys = cache.keys().await?.iter().map(ToString::to_string).collect();
        let stats = cache.stats().await?;
        Ok(Some(CacheSummary {
            generation: self.generation().to_string(),
            keys,
            stats,
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generation(&self) -> &str {
        self.lifecycle.generation()
    }

    pub fn queue(&self) -> &Arc<QueueStore> {
        &self.store
    }

    pub fn sync(&self) -> &SyncCoordinator {
        &self.sync
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }
}
