//! Storage port for managed server records.

use crate::server::domain::{ProjectId, Server, ServerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for server store operations.
pub type ServerStoreResult<T> = Result<T, ServerStoreError>;

/// Durable storage contract for server records.
///
/// Every mutating operation is conditional on the stored `version` and is
/// linearisable per record. Soft-deleted records are invisible to `load`,
/// `list_by_project`, and every conditional write.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Stores a new server record.
    ///
    /// # Errors
    ///
    /// Returns [`ServerStoreError::DuplicateServer`] when the identifier
    /// already exists.
    async fn insert(&self, server: &Server) -> ServerStoreResult<()>;

    /// Loads a live server record.
    async fn load(&self, server_id: ServerId) -> ServerStoreResult<Option<Server>>;

    /// Replaces the stored record when its version equals
    /// `expected_version`.
    ///
    /// The caller stages the new version on `server` beforehand. A record
    /// carrying `deleted_at` is soft-deleted by the swap. Returns `false`
    /// when the record is missing, deleted, or at another version.
    async fn compare_and_swap(
        &self,
        server_id: ServerId,
        expected_version: u64,
        server: &Server,
    ) -> ServerStoreResult<bool>;

    /// Sets the status to `testing` when the record is at
    /// `expected_version` and not already being tested.
    ///
    /// The version is not incremented. Returns `false` when the claim lost.
    async fn claim_for_testing(
        &self,
        server_id: ServerId,
        expected_version: u64,
    ) -> ServerStoreResult<bool>;

    /// Returns live records of a project ordered by `order`, then name.
    async fn list_by_project(&self, project_id: ProjectId) -> ServerStoreResult<Vec<Server>>;
}

/// Errors returned by server store implementations.
#[derive(Debug, Clone, Error)]
pub enum ServerStoreError {
    /// A server with the same identifier already exists.
    #[error("duplicate server identifier: {0}")]
    DuplicateServer(ServerId),

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted server data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ServerStoreError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
