//! In-memory integration tests for interleaved writers and failing collaborators.

use super::helpers::{ServerHarness, harness};
use fixhub::server::{
    domain::{ConnectionField, ProbeOutcome, VerificationStatus},
    ports::ServerStoreError,
    services::{CompletionOutcome, ServerServiceError},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn edit_while_probe_runs_wins(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Successful, 5)
        .await
        .expect("seed should succeed");
    harness.connectivity.hold().expect("hold should apply");

    let verification = harness.coordinator.verify(server.id());
    let edit = async {
        while harness.connectivity.calls().expect("calls should be readable") == 0 {
            tokio::task::yield_now().await;
        }
        let outcome = harness
            .management
            .edit_connection(server.id(), ConnectionField::IpAddress, "10.0.0.9")
            .await;
        harness.connectivity.release();
        outcome
    };
    let (verified, edited) = tokio::join!(verification, edit);

    let edit_outcome = edited.expect("edit should succeed");
    assert_eq!(edit_outcome.previous_status(), VerificationStatus::Testing);
    assert!(verified.expect("verify should not error").is_stale());
    let stored = harness.stored(server.id()).await.expect("server should load");
    assert_eq!(stored.status(), VerificationStatus::Untested);
    assert_eq!(stored.version(), 6);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_begins_claim_once(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Failed, 3)
        .await
        .expect("seed should succeed");

    let (first, second) = tokio::join!(
        harness.coordinator.begin_verification(server.id()),
        harness.coordinator.begin_verification(server.id())
    );

    let results = [first, second];
    let claimed = results.iter().filter(|result| result.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|result| matches!(result, Err(ServerServiceError::AlreadyTesting(_))))
        .count();
    assert_eq!((claimed, rejected), (1, 1));
    let stored = harness.stored(server.id()).await.expect("server should load");
    assert_eq!(stored.status(), VerificationStatus::Testing);
    assert_eq!(stored.version(), 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unavailable_store_surfaces_and_changes_nothing(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Successful, 5)
        .await
        .expect("seed should succeed");
    harness
        .store
        .set_unavailable(true)
        .expect("toggle should apply");

    let begin = harness.coordinator.begin_verification(server.id()).await;
    let edit = harness
        .management
        .edit_connection(server.id(), ConnectionField::User, "root")
        .await;

    assert!(matches!(
        begin,
        Err(ServerServiceError::Store(ServerStoreError::Persistence(_)))
    ));
    assert!(matches!(
        edit,
        Err(ServerServiceError::Store(ServerStoreError::Persistence(_)))
    ));
    harness
        .store
        .set_unavailable(false)
        .expect("toggle should apply");
    assert_eq!(harness.stored(server.id()).await.expect("server should load"), server);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn persistent_conflicts_surface_as_storage_conflict(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Successful, 5)
        .await
        .expect("seed should succeed");
    harness
        .store
        .inject_conflicts(3)
        .expect("injection should apply");

    let result = harness
        .management
        .edit_connection(server.id(), ConnectionField::Path, "/srv")
        .await;

    assert!(matches!(
        result,
        Err(ServerServiceError::StorageConflict { attempts: 3, .. })
    ));
    assert_eq!(harness.stored(server.id()).await.expect("server should load"), server);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lost_completion_write_is_stale_and_recoverable(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Untested, 2)
        .await
        .expect("seed should succeed");
    let probe = harness
        .coordinator
        .begin_verification(server.id())
        .await
        .expect("begin should succeed");
    harness
        .store
        .inject_conflicts(1)
        .expect("injection should apply");

    let outcome = harness
        .coordinator
        .complete_verification(probe, ProbeOutcome::Successful, "reachable")
        .await
        .expect("completion should not error");

    assert!(matches!(outcome, CompletionOutcome::Stale { .. }));
    let reset = harness
        .coordinator
        .reset_status(server.id())
        .await
        .expect("reset should succeed");
    assert_eq!(reset.server().status(), VerificationStatus::Untested);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn notifier_failure_keeps_change(harness: ServerHarness) {
    let server = harness
        .seed(VerificationStatus::Successful, 5)
        .await
        .expect("seed should succeed");
    harness
        .notifier
        .set_failing(true)
        .expect("toggle should apply");

    let outcome = harness
        .management
        .edit_connection(server.id(), ConnectionField::Port, "2200")
        .await
        .expect("edit should succeed despite notifier failure");

    assert!(outcome.status_reset());
    let stored = harness.stored(server.id()).await.expect("server should load");
    assert_eq!(stored.port(), Some(2200));
    assert_eq!(stored.status(), VerificationStatus::Untested);
    assert!(
        harness
            .notifier
            .events()
            .expect("events should be readable")
            .is_empty()
    );
}
