//! Notification port for verification status changes.

use crate::server::domain::{ServerId, VerificationStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for change notifier operations.
pub type ChangeNotifierResult<T> = Result<T, ChangeNotifierError>;

/// A persisted verification status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Server whose status changed.
    pub server_id: ServerId,
    /// Status before the change.
    pub old_status: VerificationStatus,
    /// Status after the change.
    pub new_status: VerificationStatus,
    /// Version of the record carrying the new status.
    pub version: u64,
}

/// Downstream consumer of status changes (UI broadcast, audit log).
///
/// Delivery is best-effort. Services call the notifier only after the change
/// is persisted and never roll back on failure.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    /// Publishes a status change.
    async fn notify(&self, change: StatusChange) -> ChangeNotifierResult<()>;
}

/// Errors returned by change notifier adapters.
#[derive(Debug, Clone, Error)]
pub enum ChangeNotifierError {
    /// The downstream channel rejected or dropped the event.
    #[error("status change delivery failed: {0}")]
    Delivery(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChangeNotifierError {
    /// Wraps a delivery failure from the notifier adapter.
    pub fn delivery(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Delivery(Arc::new(err))
    }
}
