//! In-memory integration tests for dropped verifications and stalled
//! notifications.

use super::helpers::{ServerHarness, harness, seeded_server};
use async_trait::async_trait;
use fixhub::server::{
    adapters::memory::{InMemoryConnectivityProbe, InMemoryServerStore},
    domain::{ConnectionField, Server, ServerId, VerificationStatus},
    ports::{ChangeNotifier, ChangeNotifierResult, ServerStore, StatusChange},
    services::{ServerManagementService, ServerServiceConfig, VerificationCoordinator},
};
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

/// Notifier whose deliveries never finish.
struct StalledNotifier;

#[async_trait]
impl ChangeNotifier for StalledNotifier {
    async fn notify(&self, _change: StatusChange) -> ChangeNotifierResult<()> {
        std::future::pending().await
    }
}

async fn wait_until_released(harness: &ServerHarness, server_id: ServerId) -> Server {
    for _ in 0..200 {
        let stored = harness.stored(server_id).await.expect("server should load");
        if !stored.is_testing() {
            return stored;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server {server_id} stayed in testing");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dropped_verification_restores_previous_status(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Successful, 5)
        .await
        .expect("seed should succeed");
    harness
        .connectivity
        .set_delay(Duration::from_secs(10))
        .expect("delay should apply");

    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        harness.coordinator.verify(server.id()),
    )
    .await;
    assert!(cancelled.is_err(), "verification should still be running");

    let released = wait_until_released(&harness, server.id()).await;
    assert_eq!(released.status(), VerificationStatus::Successful);
    assert_eq!(released.version(), 6);

    harness
        .connectivity
        .set_delay(Duration::ZERO)
        .expect("delay should apply");
    let probe = harness
        .coordinator
        .begin_verification(server.id())
        .await
        .expect("server should be claimable again");
    assert_eq!(probe.captured_version(), 6);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dropped_verification_after_edit_leaves_edit_alone(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Failed, 3)
        .await
        .expect("seed should succeed");
    harness.connectivity.hold().expect("hold should apply");

    let verification = harness.coordinator.verify(server.id());
    let edit_then_cancel = async {
        while harness.connectivity.calls().expect("calls should be readable") == 0 {
            tokio::task::yield_now().await;
        }
        harness
            .management
            .edit_connection(server.id(), ConnectionField::Port, "2222")
            .await
            .expect("edit should succeed");
    };
    tokio::select! {
        _ = verification => panic!("held verification should not finish"),
        () = edit_then_cancel => {}
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    let stored = harness.stored(server.id()).await.expect("server should load");
    assert_eq!(stored.status(), VerificationStatus::Untested);
    assert_eq!(stored.version(), 4);
    assert_eq!(stored.port(), Some(2222));
}

#[tokio::test(flavor = "multi_thread")]
async fn stalled_notifier_does_not_block_writes() {
    let store = Arc::new(InMemoryServerStore::new());
    let notifier = Arc::new(StalledNotifier);
    let clock = Arc::new(DefaultClock);
    let config = ServerServiceConfig::default().with_notify_timeout(Duration::from_millis(50));
    let management = ServerManagementService::new(store.clone(), notifier.clone(), clock.clone())
        .with_config(config);
    let coordinator = VerificationCoordinator::new(
        store.clone(),
        Arc::new(InMemoryConnectivityProbe::new()),
        notifier,
        clock,
    )
    .with_config(config);
    let server = seeded_server(VerificationStatus::Successful, 1).expect("server should build");
    store.insert(&server).await.expect("insert should succeed");

    let edited = tokio::time::timeout(
        Duration::from_secs(2),
        management.edit_connection(server.id(), ConnectionField::User, "root"),
    )
    .await
    .expect("edit should not wait on the notifier")
    .expect("edit should succeed");
    assert!(edited.status_reset());

    let verified = tokio::time::timeout(Duration::from_secs(2), coordinator.verify(server.id()))
        .await
        .expect("verification should not wait on the notifier")
        .expect("verification should succeed");
    let applied = verified.applied().expect("result should apply");
    assert_eq!(applied.status(), VerificationStatus::Successful);
    assert_eq!(applied.version(), 3);
}
