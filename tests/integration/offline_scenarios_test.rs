// End-to-end offline scenarios: install, offline write, replay, stale read,
// offline fallback

use super::test_harness::{json_body, TestEnv};
use hikyaku::cache::{Cache, CacheKey, CacheStorage};
use hikyaku::http::Request;
use hikyaku::lifecycle::WorkerState;
use hikyaku::sync::SyncOutcome;
use http::{Method, StatusCode};

#[tokio::test]
async fn test_install_survives_failing_manifest_entry() {
    let env = TestEnv::new();
    env.origin.fail("/offline.html");
    let worker = env.worker("v1");

    let report = worker.start().await.unwrap();

    assert_eq!(report.install.cached, vec!["/", "/manifest.json"]);
    assert_eq!(report.install.failed, vec!["/offline.html"]);
    assert_eq!(worker.state(), WorkerState::Activated);

    let cache = env.storage.open("hikyaku-v1").await.unwrap();
    let keys = cache.keys().await.unwrap();
    assert_eq!(keys, vec![CacheKey::get("/"), CacheKey::get("/manifest.json")]);
}

#[tokio::test]
async fn test_offline_write_then_online_replay() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;

    env.go_offline();
    let response = worker
        .handle_fetch(
            Request::new(Method::POST, "/api/v1/observations/")
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"code":"8310-5","value":37.2}"#),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::ACCEPTED);
    assert_eq!(response.content_type(), Some("application/json"));
    let body = json_body(&response);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["message"], "Request queued for sync when online");
    assert_eq!(body["offline"], true);
    assert_eq!(worker.queue().len().await.unwrap(), 1);
    assert!(env.origin.received_writes().is_empty());

    env.go_online();
    let outcome = worker.handle_message("ONLINE").await.unwrap().unwrap();

    let SyncOutcome::Completed(report) = outcome else {
        panic!("expected the sync to run");
    };
    assert_eq!(report.replayed, 1);
    assert!(worker.queue().is_empty().await.unwrap());

    let writes = env.origin.received_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].url, "/api/v1/observations/");
    assert_eq!(writes[0].body, r#"{"code":"8310-5","value":37.2}"#);
    assert_eq!(
        writes[0].headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn test_cached_api_read_is_served_when_offline() {
    let env = TestEnv::new();
    env.origin.serve("/api/v1/patients/", r#"[{"id":1,"name":"Ada"}]"#);
    let worker = env.started_worker("v1").await;

    let live = worker
        .handle_fetch(Request::get("/api/v1/patients/"))
        .await
        .unwrap();
    assert_eq!(live.status, StatusCode::OK);

    env.go_offline();
    let offline = worker
        .handle_fetch(Request::get("/api/v1/patients/"))
        .await
        .unwrap();

    assert_eq!(offline.status, StatusCode::OK);
    assert_eq!(offline.body, r#"[{"id":1,"name":"Ada"}]"#);
}

#[tokio::test]
async fn test_uncached_api_read_offline_gets_503_fallback() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();

    let response = worker
        .handle_fetch(Request::get("/api/v1/patients/"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(&response);
    assert_eq!(body["error"], "offline");
    assert_eq!(
        body["message"],
        "You are offline. Data will sync when connection is restored."
    );
    assert_eq!(body["cached"], false);
}

#[tokio::test]
async fn test_failed_navigation_serves_offline_document() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();

    let response = worker
        .handle_fetch(Request::navigate("/patients/42/chart"))
        .await
        .unwrap();

    assert_eq!(response.body, "<html>offline</html>");
}

#[tokio::test]
async fn test_online_write_passes_straight_through() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;

    let response = worker
        .handle_fetch(Request::new(Method::DELETE, "/api/v1/allergies/"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(env.origin.received_writes().len(), 1);
    assert!(worker.queue().is_empty().await.unwrap());
}

#[tokio::test]
async fn test_cache_first_reads_are_stable_until_eviction() {
    let env = TestEnv::new();
    env.origin.serve("/static/app.js", "console.log('v1')");
    let worker = env.started_worker("v1").await;

    let first = worker
        .handle_fetch(Request::get("/static/app.js"))
        .await
        .unwrap();
    for _ in 0..5 {
        let again = worker
            .handle_fetch(Request::get("/static/app.js"))
            .await
            .unwrap();
        assert_eq!(again.body, first.body);
    }
    worker.settle().await;
}
