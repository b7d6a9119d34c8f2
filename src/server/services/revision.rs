//! Conditional read-modify-write loop shared by the server services.

use super::{ServerServiceError, ServerServiceResult};
use crate::server::{
    domain::{Server, ServerId, VerificationStatus},
    ports::{ChangeNotifier, ServerStore, StatusChange},
};
use mockable::Clock;
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome of a persisted (or skipped) revision of a server record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    server: Server,
    changed: bool,
    previous_status: VerificationStatus,
}

impl EditOutcome {
    /// Returns the record as stored after the operation.
    #[must_use]
    pub const fn server(&self) -> &Server {
        &self.server
    }

    /// Consumes the outcome and returns the stored record.
    #[must_use]
    pub fn into_server(self) -> Server {
        self.server
    }

    /// Returns whether a new revision was persisted.
    ///
    /// Writing a value equal to the stored one persists nothing.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.changed
    }

    /// Returns the status held before the operation.
    #[must_use]
    pub const fn previous_status(&self) -> VerificationStatus {
        self.previous_status
    }

    /// Returns whether the operation reset the verification status.
    #[must_use]
    pub fn status_reset(&self) -> bool {
        self.previous_status != self.server.status()
            && self.server.status() == VerificationStatus::Untested
    }
}

/// Collaborators needed to persist a revision.
pub(super) struct Reviser<'a, S: ?Sized, N: ?Sized, C> {
    pub store: &'a S,
    pub notifier: &'a N,
    pub clock: &'a C,
    pub attempts: usize,
    pub notify_timeout: Duration,
}

impl<S, N, C> Reviser<'_, S, N, C>
where
    S: ServerStore + ?Sized,
    N: ChangeNotifier + ?Sized,
    C: Clock + Sync,
{
    /// Loads the record, applies `mutate`, and writes it back conditionally.
    ///
    /// `mutate` returns the edited record and whether anything changed.
    /// Unchanged records are returned without a write. A lost
    /// compare-and-swap reloads and retries up to `attempts` times.
    pub async fn revise<F>(&self, server_id: ServerId, mutate: F) -> ServerServiceResult<EditOutcome>
    where
        F: Fn(Server) -> ServerServiceResult<(Server, bool)> + Send + Sync,
    {
        for attempt in 1..=self.attempts {
            let current = self
                .store
                .load(server_id)
                .await?
                .ok_or(ServerServiceError::NotFound(server_id))?;
            let expected_version = current.version();
            let previous_status = current.status();

            let (mut server, changed) = mutate(current)?;
            if !changed {
                return Ok(EditOutcome {
                    server,
                    changed,
                    previous_status,
                });
            }

            server.stage_revision(self.clock);
            if self
                .store
                .compare_and_swap(server_id, expected_version, &server)
                .await?
            {
                publish_status_change(self.notifier, self.notify_timeout, previous_status, &server)
                    .await;
                return Ok(EditOutcome {
                    server,
                    changed,
                    previous_status,
                });
            }

            debug!(%server_id, expected_version, attempt, "server changed concurrently, retrying");
        }

        Err(ServerServiceError::StorageConflict {
            server_id,
            attempts: self.attempts,
        })
    }
}

/// Tells the notifier about a persisted status change, if there was one.
///
/// Failures and deliveries exceeding `timeout` are logged and swallowed: the
/// change is already durable.
pub(super) async fn publish_status_change<N>(
    notifier: &N,
    timeout: Duration,
    old_status: VerificationStatus,
    server: &Server,
) where
    N: ChangeNotifier + ?Sized,
{
    if old_status == server.status() {
        return;
    }

    let change = StatusChange {
        server_id: server.id(),
        old_status,
        new_status: server.status(),
        version: server.version(),
    };
    match tokio::time::timeout(timeout, notifier.notify(change)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(
            server_id = %change.server_id,
            old_status = %change.old_status,
            new_status = %change.new_status,
            error = %err,
            "status change notification failed"
        ),
        Err(_) => warn!(
            server_id = %change.server_id,
            old_status = %change.old_status,
            new_status = %change.new_status,
            ?timeout,
            "status change notification timed out"
        ),
    }
}
