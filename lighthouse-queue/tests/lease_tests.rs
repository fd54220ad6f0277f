mod support;

use chrono::{Duration, Utc};
use lighthouse_queue::SyncLease;
use lighthouse_storage::KeyValueStore;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use support::*;

fn write_lease(backend: &dyn KeyValueStore, lease: &SyncLease) {
    backend
        .set("sync-lease", &serde_json::to_string(lease).unwrap())
        .unwrap();
}

#[tokio::test]
async fn fresh_foreign_lease_makes_drain_a_no_op() {
    let (backend, _, queue) = queue();
    enqueue_fixtures(&queue).await;
    let foreign = SyncLease::new(Utc::now() - Duration::minutes(1));
    write_lease(backend.as_ref(), &foreign);

    let analyzer = RecordingAnalyzer::default();
    let summary = queue.drain(&analyzer).await.unwrap();

    assert!(summary.lease_held);
    assert_eq!(summary.succeeded + summary.failed, 0);
    assert_eq!(analyzer.calls(), 0);
    let items = queue.items().await.unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|i| i.attempts == 0));
    assert_eq!(queue.lease().unwrap(), Some(foreign));
}

#[tokio::test]
async fn abandoned_lease_is_ignored() {
    let (backend, _, queue) = queue();
    enqueue_fixtures(&queue).await;
    write_lease(
        backend.as_ref(),
        &SyncLease::new(Utc::now() - Duration::minutes(6)),
    );

    let summary = queue.drain(&RecordingAnalyzer::default()).await.unwrap();
    assert!(!summary.lease_held);
    assert_eq!(summary.succeeded, 3);
    assert_eq!(queue.lease().unwrap(), None);
}

#[tokio::test]
async fn lease_is_released_after_failing_drain() {
    let (_, _, queue) = queue();
    enqueue_fixtures(&queue).await;

    queue.drain(&OfflineAnalyzer::default()).await.unwrap();
    assert_eq!(queue.lease().unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_drain_sees_lease_and_enqueue_is_not_lost() {
    let (_, _, queue) = queue();
    queue.enqueue("Life_Insurance_Policy.pdf", "application/pdf", POLICY).await.unwrap();
    let gated = Arc::new(GatedAnalyzer::default());

    let first = {
        let queue = Arc::clone(&queue);
        let gated = Arc::clone(&gated);
        tokio::spawn(async move { queue.drain(gated.as_ref()).await })
    };
    gated.entered.notified().await;

    let lease = queue.lease().unwrap().expect("lease held during drain");
    let second = queue.drain(&RecordingAnalyzer::default()).await.unwrap();
    assert!(second.lease_held);

    queue.enqueue("State_ID_Card.pdf", "application/pdf", STATE_ID).await.unwrap();
    assert_eq!(queue.items().await.unwrap()[0].attempts, 1);

    gated.release.notify_one();
    let summary = first.await.unwrap().unwrap();
    assert_eq!(summary.succeeded, 1);

    let remaining = queue.items().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].file_name, "State_ID_Card.pdf");
    assert_ne!(queue.lease().unwrap().map(|l| l.holder), Some(lease.holder));
}
