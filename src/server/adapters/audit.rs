//! Change notifier that writes status changes to the audit log.

use crate::server::ports::{ChangeNotifier, ChangeNotifierResult, StatusChange};
use async_trait::async_trait;
use tracing::info;

/// Emits each status change as a structured `tracing` event under the
/// `fixhub::audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChangeNotifier;

impl TracingChangeNotifier {
    /// Creates an audit-log notifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangeNotifier for TracingChangeNotifier {
    async fn notify(&self, change: StatusChange) -> ChangeNotifierResult<()> {
        info!(
            target: "fixhub::audit",
            server_id = %change.server_id,
            old_status = %change.old_status,
            new_status = %change.new_status,
            version = change.version,
            "server verification status changed"
        );
        Ok(())
    }
}
