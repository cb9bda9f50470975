// Test utilities: a scripted origin server and worker construction over a
// real on-disk queue

use async_trait::async_trait;
use bytes::Bytes;
use hikyaku::cache::MemoryCacheStorage;
use hikyaku::config::Config;
use hikyaku::http::{ConnectivityFlag, Network, NetworkError, Request, Response};
use hikyaku::queue::TokioFsBackend;
use hikyaku::ServiceWorker;
use http::{Method, StatusCode};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// In-process origin: fixed GET bodies, accepts every write with 201
pub struct ScriptedOrigin {
    reachable: AtomicBool,
    pages: Mutex<HashMap<String, Bytes>>,
    failing: Mutex<HashSet<String>>,
    received: Mutex<Vec<Request>>,
    latency: Mutex<Option<Duration>>,
}

impl ScriptedOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            pages: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            received: Mutex::new(Vec::new()),
            latency: Mutex::new(None),
        })
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.pages
            .lock()
            .insert(url.to_string(), Bytes::from(body.to_string()));
    }

    /// Transport failure for one URL
    pub fn fail(&self, url: &str) {
        self.failing.lock().insert(url.to_string());
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Writes that actually reached the origin
    pub fn received_writes(&self) -> Vec<Request> {
        self.received
            .lock()
            .iter()
            .filter(|r| r.method != Method::GET)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Network for ScriptedOrigin {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable("network is down".to_string()));
        }
        if self.failing.lock().contains(&request.url) {
            return Err(NetworkError::Timeout);
        }
        self.received.lock().push(request.clone());

        if request.method != Method::GET {
            return Ok(Response::new(StatusCode::CREATED));
        }
        let page = self.pages.lock().get(&request.url).cloned();
        Ok(match page {
            Some(body) => Response::new(StatusCode::OK).with_body(body),
            None => Response::new(StatusCode::NOT_FOUND),
        })
    }
}

pub fn config_for(queue_dir: &Path, version: &str) -> Config {
    let mut config = Config::default();
    config.queue.dir = queue_dir.to_string_lossy().to_string();
    config.cache.version = version.to_string();
    config
}

/// Everything one test needs, sharing state the way a host process would
pub struct TestEnv {
    pub origin: Arc<ScriptedOrigin>,
    pub connectivity: Arc<ConnectivityFlag>,
    pub storage: Arc<MemoryCacheStorage>,
    pub queue_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let origin = ScriptedOrigin::new();
        origin.serve("/", "<html>home</html>");
        origin.serve("/offline.html", "<html>offline</html>");
        origin.serve("/manifest.json", r#"{"name":"ehr"}"#);
        Self {
            origin,
            connectivity: Arc::new(ConnectivityFlag::new(true)),
            storage: Arc::new(MemoryCacheStorage::new(16 * 1024 * 1024)),
            queue_dir: TempDir::new().unwrap(),
        }
    }

    /// A fresh worker process over the same origin, caches and queue directory
    pub fn worker(&self, version: &str) -> ServiceWorker {
        ServiceWorker::new(
            config_for(self.queue_dir.path(), version),
            self.origin.clone(),
            self.connectivity.clone(),
            self.storage.clone(),
            Arc::new(TokioFsBackend::new()),
        )
        .unwrap()
    }

    pub async fn started_worker(&self, version: &str) -> ServiceWorker {
        let worker = self.worker(version);
        worker.start().await.unwrap();
        worker
    }

    /// Device loses its connection: client sees offline, origin unreachable
    pub fn go_offline(&self) {
        self.connectivity.set_online(false);
        self.origin.set_reachable(false);
    }

    pub fn go_online(&self) {
        self.origin.set_reachable(true);
        self.connectivity.set_online(true);
    }
}

pub fn json_body(response: &Response) -> serde_json::Value {
    serde_json::from_slice(&response.body).unwrap()
}
