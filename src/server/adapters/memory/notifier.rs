//! In-memory change notifier that records published events.

use crate::server::ports::{
    ChangeNotifier, ChangeNotifierError, ChangeNotifierResult, StatusChange,
};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

/// Change notifier that keeps every event in memory.
///
/// Suitable for tests and for local flows that inspect emitted changes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChangeNotifier {
    state: Arc<RwLock<NotifierState>>,
}

#[derive(Debug, Default)]
struct NotifierState {
    events: Vec<StatusChange>,
    failing: bool,
}

impl InMemoryChangeNotifier {
    /// Creates a notifier with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent deliveries fail without recording the event.
    ///
    /// # Errors
    ///
    /// Returns delivery errors when lock acquisition fails.
    pub fn set_failing(&self, failing: bool) -> ChangeNotifierResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ChangeNotifierError::delivery(std::io::Error::other(err.to_string())))?;
        state.failing = failing;
        Ok(())
    }

    /// Returns every recorded event in delivery order.
    ///
    /// # Errors
    ///
    /// Returns delivery errors when lock acquisition fails.
    pub fn events(&self) -> ChangeNotifierResult<Vec<StatusChange>> {
        let state = self
            .state
            .read()
            .map_err(|err| ChangeNotifierError::delivery(std::io::Error::other(err.to_string())))?;
        Ok(state.events.clone())
    }
}

#[async_trait]
impl ChangeNotifier for InMemoryChangeNotifier {
    async fn notify(&self, change: StatusChange) -> ChangeNotifierResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ChangeNotifierError::delivery(std::io::Error::other(err.to_string())))?;

        if state.failing {
            return Err(ChangeNotifierError::delivery(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "notification channel closed",
            )));
        }

        state.events.push(change);
        Ok(())
    }
}
