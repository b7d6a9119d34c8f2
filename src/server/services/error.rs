//! Service-level errors for server management and verification.

use crate::server::{
    domain::{ProjectId, ServerDomainError, ServerId},
    ports::ServerStoreError,
};
use thiserror::Error;

/// Errors returned by server services.
#[derive(Debug, Error)]
pub enum ServerServiceError {
    /// Domain validation failed. Nothing was written.
    #[error(transparent)]
    Domain(#[from] ServerDomainError),

    /// Storage operation failed. Nothing was written.
    #[error(transparent)]
    Store(#[from] ServerStoreError),

    /// No live server exists with the given identifier.
    #[error("server {0} not found")]
    NotFound(ServerId),

    /// The server belongs to another project.
    #[error("server {server_id} does not belong to project {project_id}")]
    WrongProject {
        /// Server identifier.
        server_id: ServerId,
        /// Project the caller expected.
        project_id: ProjectId,
    },

    /// A verification probe is already in flight for the server.
    #[error("server {0} is already being tested")]
    AlreadyTesting(ServerId),

    /// Concurrent writers kept winning the conditional write.
    #[error("server {server_id} kept changing concurrently after {attempts} attempts")]
    StorageConflict {
        /// Server identifier.
        server_id: ServerId,
        /// Attempts made before giving up.
        attempts: usize,
    },
}

/// Result type for server service operations.
pub type ServerServiceResult<T> = Result<T, ServerServiceError>;
