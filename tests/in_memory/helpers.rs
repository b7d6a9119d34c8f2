//! Shared test helpers for in-memory server integration tests.

use chrono::Utc;
use fixhub::server::{
    adapters::memory::{InMemoryChangeNotifier, InMemoryConnectivityProbe, InMemoryServerStore},
    domain::{
        ConnectionDetails, PersistedServerData, ProjectId, Server, ServerId, ServerName,
        VerificationStatus,
    },
    ports::ServerStore,
    services::{ServerManagementService, ServerServiceConfig, VerificationCoordinator},
};
use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;

/// Management service wired to in-memory adapters.
pub type TestManagement =
    ServerManagementService<InMemoryServerStore, InMemoryChangeNotifier, DefaultClock>;

/// Verification coordinator wired to in-memory adapters.
pub type TestCoordinator = VerificationCoordinator<
    InMemoryServerStore,
    InMemoryConnectivityProbe,
    InMemoryChangeNotifier,
    DefaultClock,
>;

/// Services and adapters sharing one in-memory store.
pub struct ServerHarness {
    /// Backing store.
    pub store: Arc<InMemoryServerStore>,
    /// Scripted connectivity probe.
    pub connectivity: Arc<InMemoryConnectivityProbe>,
    /// Recording notifier.
    pub notifier: Arc<InMemoryChangeNotifier>,
    /// Edit service.
    pub management: TestManagement,
    /// Verification service.
    pub coordinator: TestCoordinator,
}

impl ServerHarness {
    /// Builds a harness with the given service configuration.
    #[must_use]
    pub fn with_config(config: ServerServiceConfig) -> Self {
        let store = Arc::new(InMemoryServerStore::new());
        let connectivity = Arc::new(InMemoryConnectivityProbe::new());
        let notifier = Arc::new(InMemoryChangeNotifier::new());
        let clock = Arc::new(DefaultClock);
        let management =
            ServerManagementService::new(store.clone(), notifier.clone(), clock.clone())
                .with_config(config);
        let coordinator = VerificationCoordinator::new(
            store.clone(),
            connectivity.clone(),
            notifier.clone(),
            clock,
        )
        .with_config(config);

        Self {
            store,
            connectivity,
            notifier,
            management,
            coordinator,
        }
    }

    /// Stores a server at the given status and version.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored.
    pub async fn seed(
        &self,
        status: VerificationStatus,
        version: u64,
    ) -> Result<Server, eyre::Report> {
        let server = seeded_server(status, version)?;
        self.store.insert(&server).await?;
        Ok(server)
    }

    /// Loads a live server that must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the load fails or the server is missing.
    pub async fn stored(&self, server_id: ServerId) -> Result<Server, eyre::Report> {
        self.store
            .load(server_id)
            .await?
            .ok_or_else(|| eyre::eyre!("server {server_id} should exist"))
    }
}

/// Builds a fully configured server record at the given status and version.
///
/// # Errors
///
/// Returns an error if the fixed server name is rejected.
pub fn seeded_server(status: VerificationStatus, version: u64) -> Result<Server, eyre::Report> {
    let timestamp = Utc::now();
    Ok(Server::from_persisted(PersistedServerData {
        id: ServerId::new(),
        project_id: ProjectId::new(),
        name: ServerName::new("web-01")?,
        connection: ConnectionDetails {
            user: Some("deploy".to_owned()),
            ip_address: Some("10.0.0.5".to_owned()),
            path: Some("/a/b/".to_owned()),
            port: Some(22),
        },
        deploy_code: true,
        order: 0,
        status,
        output: None,
        version,
        created_at: timestamp,
        updated_at: timestamp,
        deleted_at: None,
    }))
}

/// Provides a harness with default configuration.
#[fixture]
pub fn harness() -> ServerHarness {
    ServerHarness::with_config(ServerServiceConfig::default())
}
