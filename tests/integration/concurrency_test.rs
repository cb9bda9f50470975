// Overlapping sync triggers and concurrent offline writes

use super::test_harness::TestEnv;
use hikyaku::http::Request;
use hikyaku::sync::SyncOutcome;
use http::Method;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_background_sync_and_online_message_do_not_double_replay() {
    let env = TestEnv::new();
    let worker = env.started_worker("v1").await;
    env.go_offline();
    for body in ["1", "2", "3"] {
        worker
            .handle_fetch(Request::new(Method::POST, "/api/v1/observations/").with_body(body))
            .await
            .unwrap();
    }
    env.go_online();
    env.origin.set_latency(Duration::from_millis(20));

    let (from_sync, from_message) = tokio::join!(
        worker.handle_sync("sync-pending-requests"),
        worker.handle_message("ONLINE"),
    );

    let from_sync = from_sync.unwrap().unwrap();
    let from_message = from_message.unwrap().unwrap();
    assert_eq!(from_message, SyncOutcome::Coalesced);
    let SyncOutcome::Completed(report) = from_sync else {
        panic!("first trigger should have run the sync");
    };
    assert_eq!(report.replayed, 3);

    // Every queued write reached the origin exactly once
    assert_eq!(env.origin.received_writes().len(), 3);
    assert!(worker.queue().is_empty().await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_offline_writes_get_distinct_entries() {
    let env = TestEnv::new();
    let worker = Arc::new(env.started_worker("v1").await);
    env.go_offline();

    let mut handles = Vec::new();
    for i in 0..20 {
        let worker = worker.clone();
        handles.push(tokio::spawn(async move {
            worker
                .handle_fetch(
                    Request::new(Method::POST, "/api/v1/observations/").with_body(format!("{}", i)),
                )
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let queued = worker.queue().drain_all().await.unwrap();
    assert_eq!(queued.len(), 20);
    let ids: HashSet<u64> = queued.iter().map(|q| q.id).collect();
    assert_eq!(ids.len(), 20);
    let bodies: HashSet<String> = queued.into_iter().map(|q| q.body).collect();
    assert_eq!(bodies.len(), 20);
}
