// Durable queue behaviour across worker restarts and partial replay failures

use super::test_harness::TestEnv;
use hikyaku::http::Request;
use hikyaku::sync::SyncOutcome;
use http::{Method, StatusCode};

#[tokio::test]
async fn test_queued_write_survives_restart() {
    let env = TestEnv::new();
    let request = Request::new(Method::PUT, "/api/v1/medications/")
        .with_header("Content-Type", "application/json")
        .with_header("Authorization", "Bearer nurse-7")
        .with_body(r#"{"id":9,"dose":"5mg"}"#);

    {
        let worker = env.started_worker("v1").await;
        env.go_offline();
        let ack = worker.handle_fetch(request.clone()).await.unwrap();
        assert_eq!(ack.status, StatusCode::ACCEPTED);

        // Committed before the ack was returned
        let queued = worker.queue().drain_all().await.unwrap();
        assert_eq!(queued.len(), 1);
    }

    // New process over the same queue directory
    let restarted = env.worker("v1");
    let queued = restarted.queue().drain_all().await.unwrap();

    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].url, request.url);
    assert_eq!(queued[0].method, "PUT");
    assert_eq!(queued[0].headers, request.headers);
    assert_eq!(queued[0].body, r#"{"id":9,"dose":"5mg"}"#);
}

#[tokio::test]
async fn test_successful_sync_leaves_queue_empty() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();
    for i in 0..5 {
        worker
            .handle_fetch(
                Request::new(Method::POST, "/api/v1/observations/").with_body(format!("{{\"n\":{}}}", i)),
            )
            .await
            .unwrap();
    }
    assert_eq!(worker.queue().len().await.unwrap(), 5);

    env.go_online();
    let outcome = worker
        .handle_sync("sync-pending-requests")
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(outcome, SyncOutcome::Completed(ref r) if r.replayed == 5 && r.remaining == 0));
    assert!(worker.queue().is_empty().await.unwrap());

    // Replayed in the order they were written
    let bodies: Vec<_> = env
        .origin
        .received_writes()
        .into_iter()
        .map(|r| r.body)
        .collect();
    let expected: Vec<String> = (0..5).map(|i| format!("{{\"n\":{}}}", i)).collect();
    assert_eq!(bodies, expected);
}

#[tokio::test]
async fn test_failed_replay_is_retained_others_removed() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();
    worker
        .handle_fetch(Request::new(Method::POST, "/api/v1/allergies/").with_body("A"))
        .await
        .unwrap();
    worker
        .handle_fetch(Request::new(Method::POST, "/api/v1/conditions/").with_body("B"))
        .await
        .unwrap();

    env.go_online();
    env.origin.fail("/api/v1/allergies/");
    worker.handle_message("ONLINE").await.unwrap().unwrap();

    let left = worker.queue().drain_all().await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].url, "/api/v1/allergies/");
    assert_eq!(left[0].body, "A");
    assert_eq!(left[0].attempts, 1);

    let writes = env.origin.received_writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].body, "B");
}

#[tokio::test]
async fn test_unrelated_sync_tag_and_message_are_ignored() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();
    worker
        .handle_fetch(Request::new(Method::POST, "/api/v1/observations/"))
        .await
        .unwrap();
    env.go_online();

    assert!(worker.handle_sync("periodic-refresh").await.is_none());
    assert!(worker.handle_message("SKIP_WAITING").await.is_none());
    assert_eq!(worker.queue().len().await.unwrap(), 1);
}
