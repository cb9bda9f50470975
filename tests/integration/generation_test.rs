// Cache generations across successive deployments

use super::test_harness::TestEnv;
use hikyaku::cache::CacheStorage;
use hikyaku::http::Request;
use hikyaku::lifecycle::WorkerState;

#[tokio::test]
async fn test_only_current_generation_survives_activation() {
    let env = TestEnv::new();

    for version in ["v1", "v2", "v3", "v4"] {
        let worker = env.started_worker(version).await;
        worker.shutdown().await;

        let names = env.storage.keys().await.unwrap();
        assert_eq!(names, vec![format!("hikyaku-{}", version)]);
    }
}

#[tokio::test]
async fn test_new_generation_does_not_serve_old_entries() {
    let env = TestEnv::new();
    env.origin.serve("/static/app.js", "v1 bundle");
    let v1 = env.started_worker("v1").await;
    v1.handle_fetch(Request::get("/static/app.js")).await.unwrap();
    v1.shutdown().await;

    env.origin.serve("/static/app.js", "v2 bundle");
    let v2 = env.started_worker("v2").await;
    env.go_offline();

    // Old generation is gone, so the miss goes to the (now unreachable) network
    assert!(v2.handle_fetch(Request::get("/static/app.js")).await.is_err());
    assert!(env.storage.get("hikyaku-v1").await.is_none());
}

#[tokio::test]
async fn test_redundant_worker_stops_intercepting() {
    let env = TestEnv::new();
    let v1 = env.started_worker("v1").await;
    v1.shutdown().await;
    env.go_offline();

    // Not active any more: the write is not queued and fails in transport
    let result = v1
        .handle_fetch(Request::new(http::Method::POST, "/api/v1/observations/"))
        .await;
    assert!(result.is_err());
    assert!(v1.queue().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_newer_version_supersedes_running_worker() {
    let env = TestEnv::new();
    env.origin.serve("/static/app.js", "bundle");
    let v1 = env.started_worker("v1").await;
    assert_eq!(v1.state(), WorkerState::Activated);

    // v1 is never shut down; v2 takes over while it is still alive
    let v2 = env.started_worker("v2").await;
    assert_eq!(v2.state(), WorkerState::Activated);
    assert_eq!(v1.state(), WorkerState::Redundant);

    let response = v1.handle_fetch(Request::get("/static/app.js")).await.unwrap();
    assert_eq!(response.body, "bundle");
    v1.settle().await;

    // The superseded worker passed the read through without recreating its generation
    assert_eq!(env.storage.keys().await.unwrap(), vec!["hikyaku-v2"]);
    assert!(v1.cache_summary().await.unwrap().is_none());

    // Offline writes reaching the old worker are not queued by it
    env.go_offline();
    let result = v1
        .handle_fetch(Request::new(http::Method::POST, "/api/v1/observations/"))
        .await;
    assert!(result.is_err());
    assert!(v1.queue().is_empty().await.unwrap());
}
