//! Verification coordination for managed servers.
//!
//! At most one probe runs per server. A probe captures the record version
//! when it starts, and its result is only applied while the record is still
//! at that version. An edit landing in between wins.

use super::{
    ServerServiceConfig, ServerServiceError, ServerServiceResult,
    revision::{EditOutcome, Reviser, publish_status_change},
};
use crate::server::{
    domain::{ProbeOutcome, Server, ServerDomainError, ServerId, VerificationStatus},
    ports::{ChangeNotifier, ConnectivityProbe, ProbeReport, ServerStore},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Handle for an in-flight verification probe.
///
/// The handle is consumed by [`VerificationCoordinator::complete_verification`]
/// or [`VerificationCoordinator::abandon_verification`].
#[derive(Debug, PartialEq, Eq)]
pub struct VerificationProbe {
    server_id: ServerId,
    captured_version: u64,
    previous_status: VerificationStatus,
    started_at: DateTime<Utc>,
}

impl VerificationProbe {
    /// Returns the probed server.
    #[must_use]
    pub const fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Returns the record version observed when the probe started.
    #[must_use]
    pub const fn captured_version(&self) -> u64 {
        self.captured_version
    }

    /// Returns the status held before the probe claimed the server.
    #[must_use]
    pub const fn previous_status(&self) -> VerificationStatus {
        self.previous_status
    }

    /// Returns when the probe started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    const fn duplicate(&self) -> Self {
        Self {
            server_id: self.server_id,
            captured_version: self.captured_version,
            previous_status: self.previous_status,
            started_at: self.started_at,
        }
    }
}

/// Result of settling a verification probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The result was persisted.
    Applied(Server),
    /// The record changed after the probe started; nothing was written.
    Stale {
        /// Probed server.
        server_id: ServerId,
        /// Version the probe started from.
        captured_version: u64,
        /// Version currently stored, or `None` when the server is gone.
        current_version: Option<u64>,
    },
}

impl CompletionOutcome {
    /// Returns whether the result was discarded.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// Returns the persisted record when the result was applied.
    #[must_use]
    pub const fn applied(&self) -> Option<&Server> {
        match self {
            Self::Applied(server) => Some(server),
            Self::Stale { .. } => None,
        }
    }
}

/// Coordinates verification probes against the server store.
pub struct VerificationCoordinator<S, P, N, C>
where
    S: ServerStore,
    P: ConnectivityProbe,
    N: ChangeNotifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    connectivity: Arc<P>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: ServerServiceConfig,
}

impl<S, P, N, C> Clone for VerificationCoordinator<S, P, N, C>
where
    S: ServerStore,
    P: ConnectivityProbe,
    N: ChangeNotifier,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            connectivity: Arc::clone(&self.connectivity),
            notifier: Arc::clone(&self.notifier),
            clock: Arc::clone(&self.clock),
            config: self.config,
        }
    }
}

impl<S, P, N, C> VerificationCoordinator<S, P, N, C>
where
    S: ServerStore,
    P: ConnectivityProbe,
    N: ChangeNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, connectivity: Arc<P>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            store,
            connectivity,
            notifier,
            clock,
            config: ServerServiceConfig::default(),
        }
    }

    /// Replaces the coordinator configuration.
    #[must_use]
    pub const fn with_config(mut self, config: ServerServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Applies a probe result when the record has not changed since the
    /// probe started.
    ///
    /// A discarded result is reported as [`CompletionOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// Returns store errors. Nothing is written on error.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "a probe handle settles at most once"
    )]
    pub async fn complete_verification(
        &self,
        probe: VerificationProbe,
        outcome: ProbeOutcome,
        output: impl Into<String>,
    ) -> ServerServiceResult<CompletionOutcome> {
        let text = output.into();
        let clock = &*self.clock;
        self.settle(&probe, |server| server.record_outcome(outcome, text, clock))
            .await
    }

    /// Releases a probe without a result, restoring the status it replaced.
    ///
    /// # Errors
    ///
    /// Returns store errors. Nothing is written on error.
    #[expect(
        clippy::needless_pass_by_value,
        reason = "a probe handle settles at most once"
    )]
    pub async fn abandon_verification(
        &self,
        probe: VerificationProbe,
    ) -> ServerServiceResult<CompletionOutcome> {
        let previous = probe.previous_status();
        let clock = &*self.clock;
        self.settle(&probe, |server| server.release_probe(previous, clock))
            .await
    }

    /// Forces the status back to `untested`.
    ///
    /// Used to release a server whose probe will never complete. Any probe
    /// still running against it becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::NotFound`] for unknown servers,
    /// [`ServerServiceError::StorageConflict`], and store errors.
    pub async fn reset_status(&self, server_id: ServerId) -> ServerServiceResult<EditOutcome> {
        let reviser = Reviser {
            store: &*self.store,
            notifier: &*self.notifier,
            clock: &*self.clock,
            attempts: self.config.attempts(),
            notify_timeout: self.config.notify_timeout,
        };
        reviser
            .revise(server_id, |mut server| {
                let changed = server.status() != VerificationStatus::Untested;
                server.mark_untested();
                Ok((server, changed))
            })
            .await
    }

    async fn claim(&self, server_id: ServerId) -> ServerServiceResult<(VerificationProbe, Server)> {
        let attempts = self.config.attempts();
        for attempt in 1..=attempts {
            let mut server = self
                .store
                .load(server_id)
                .await?
                .ok_or(ServerServiceError::NotFound(server_id))?;
            let captured_version = server.version();
            let previous_status = match server.claim_for_testing() {
                Ok(previous) => previous,
                Err(ServerDomainError::AlreadyTesting(id)) => {
                    return Err(ServerServiceError::AlreadyTesting(id));
                }
                Err(err) => return Err(err.into()),
            };

            if self
                .store
                .claim_for_testing(server_id, captured_version)
                .await?
            {
                debug!(%server_id, captured_version, %previous_status, "verification started");
                let probe = VerificationProbe {
                    server_id,
                    captured_version,
                    previous_status,
                    started_at: self.clock.utc(),
                };
                return Ok((probe, server));
            }

            debug!(%server_id, captured_version, attempt, "verification claim lost, retrying");
        }

        Err(ServerServiceError::StorageConflict { server_id, attempts })
    }

    async fn settle<F>(
        &self,
        probe: &VerificationProbe,
        apply: F,
    ) -> ServerServiceResult<CompletionOutcome>
    where
        F: FnOnce(&mut Server) -> Result<(), ServerDomainError> + Send,
    {
        let server_id = probe.server_id();
        let captured_version = probe.captured_version();

        let current = self.store.load(server_id).await?;
        let current_version = current.as_ref().map(Server::version);
        let Some(mut server) = current
            .filter(|stored| stored.version() == captured_version && stored.is_testing())
        else {
            return Ok(discard(probe, current_version));
        };

        apply(&mut server)?;
        if !self
            .store
            .compare_and_swap(server_id, captured_version, &server)
            .await?
        {
            let latest = self.store.load(server_id).await?;
            return Ok(discard(probe, latest.as_ref().map(Server::version)));
        }

        debug!(
            %server_id,
            version = server.version(),
            status = %server.status(),
            "verification settled"
        );
        self.publish(VerificationStatus::Testing, &server).await;
        Ok(CompletionOutcome::Applied(server))
    }

    async fn publish(&self, old_status: VerificationStatus, server: &Server) {
        publish_status_change(&*self.notifier, self.config.notify_timeout, old_status, server)
            .await;
    }
}

impl<S, P, N, C> VerificationCoordinator<S, P, N, C>
where
    S: ServerStore + 'static,
    P: ConnectivityProbe + 'static,
    N: ChangeNotifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Marks the server as `testing` and returns the probe handle.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::AlreadyTesting`] when a probe is already
    /// in flight, [`ServerServiceError::NotFound`] for unknown servers,
    /// [`ServerServiceError::StorageConflict`] when concurrent writers keep
    /// winning, and store errors. The record is untouched on error.
    pub async fn begin_verification(
        &self,
        server_id: ServerId,
    ) -> ServerServiceResult<VerificationProbe> {
        let (probe, server) = self.claim(server_id).await?;
        let release = ClaimRelease::arm(self.clone(), probe.duplicate());
        self.publish(probe.previous_status(), &server).await;
        release.disarm();
        Ok(probe)
    }

    /// Runs a full verification under the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::begin_verification`] and
    /// [`Self::complete_verification`]. Unreachable servers are not errors.
    pub async fn verify(&self, server_id: ServerId) -> ServerServiceResult<CompletionOutcome> {
        self.verify_with_timeout(server_id, self.config.probe_timeout)
            .await
    }

    /// Runs a full verification, treating a probe exceeding `timeout` as
    /// failed.
    ///
    /// Probe runner errors are recorded as failed with the error text. When
    /// the returned future is dropped before the result is stored, the
    /// claim is abandoned in a background task and the previous status
    /// comes back.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::begin_verification`] and
    /// [`Self::complete_verification`].
    pub async fn verify_with_timeout(
        &self,
        server_id: ServerId,
        timeout: Duration,
    ) -> ServerServiceResult<CompletionOutcome> {
        let (probe, server) = self.claim(server_id).await?;
        let release = ClaimRelease::arm(self.clone(), probe.duplicate());
        self.publish(probe.previous_status(), &server).await;

        let report = match tokio::time::timeout(timeout, self.connectivity.probe(&server)).await {
            Ok(Ok(report)) => report,
            Ok(Err(err)) => {
                warn!(%server_id, error = %err, "connectivity probe failed to run");
                ProbeReport::failed(err.to_string())
            }
            Err(_) => {
                warn!(%server_id, ?timeout, "connectivity probe timed out");
                ProbeReport::failed(format!("verification timed out after {timeout:?}"))
            }
        };

        let settled = self
            .complete_verification(probe, report.outcome, report.output)
            .await;
        if settled.is_ok() {
            release.disarm();
        }
        settled
    }
}

/// Abandons a claimed verification when dropped before being disarmed.
///
/// Dropping happens when the owning future is cancelled, so the release
/// runs as a spawned task on the current runtime.
struct ClaimRelease<S, P, N, C>
where
    S: ServerStore + 'static,
    P: ConnectivityProbe + 'static,
    N: ChangeNotifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    coordinator: VerificationCoordinator<S, P, N, C>,
    probe: Option<VerificationProbe>,
}

impl<S, P, N, C> ClaimRelease<S, P, N, C>
where
    S: ServerStore + 'static,
    P: ConnectivityProbe + 'static,
    N: ChangeNotifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    const fn arm(
        coordinator: VerificationCoordinator<S, P, N, C>,
        probe: VerificationProbe,
    ) -> Self {
        Self {
            coordinator,
            probe: Some(probe),
        }
    }

    fn disarm(mut self) {
        self.probe = None;
    }
}

impl<S, P, N, C> Drop for ClaimRelease<S, P, N, C>
where
    S: ServerStore + 'static,
    P: ConnectivityProbe + 'static,
    N: ChangeNotifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let Some(probe) = self.probe.take() else {
            return;
        };
        let server_id = probe.server_id();
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(%server_id, "no runtime left to release a cancelled verification");
            return;
        };

        let coordinator = self.coordinator.clone();
        drop(runtime.spawn(async move {
            match coordinator.abandon_verification(probe).await {
                Ok(outcome) => debug!(
                    %server_id,
                    stale = outcome.is_stale(),
                    "cancelled verification released"
                ),
                Err(err) => warn!(
                    %server_id,
                    error = %err,
                    "failed to release cancelled verification"
                ),
            }
        }));
    }
}

fn discard(probe: &VerificationProbe, current_version: Option<u64>) -> CompletionOutcome {
    info!(
        server_id = %probe.server_id,
        captured_version = probe.captured_version,
        ?current_version,
        started_at = %probe.started_at,
        "discarding stale verification result"
    );
    CompletionOutcome::Stale {
        server_id: probe.server_id,
        captured_version: probe.captured_version,
        current_version,
    }
}
