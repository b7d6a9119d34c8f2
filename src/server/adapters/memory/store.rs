//! In-memory store for managed server records.

use crate::server::{
    domain::{ProjectId, Server, ServerId},
    ports::{ServerStore, ServerStoreError, ServerStoreResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory server store.
///
/// Each operation runs under a single lock acquisition, which makes every
/// conditional write linearisable. Fault injection hooks let tests simulate
/// an unavailable backend or concurrent writers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryServerStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    servers: HashMap<ServerId, Server>,
    unavailable: bool,
    injected_conflicts: usize,
}

impl InMemoryServerStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with a persistence error until
    /// reset.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn set_unavailable(&self, unavailable: bool) -> ServerStoreResult<()> {
        let mut state = self.write_state_unchecked()?;
        state.unavailable = unavailable;
        Ok(())
    }

    /// Makes the next `count` compare-and-swap calls lose as if a concurrent
    /// writer had won.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn inject_conflicts(&self, count: usize) -> ServerStoreResult<()> {
        let mut state = self.write_state_unchecked()?;
        state.injected_conflicts = count;
        Ok(())
    }

    /// Returns a stored record including soft-deleted ones.
    ///
    /// # Errors
    ///
    /// Returns persistence errors when lock acquisition fails.
    pub fn load_including_deleted(&self, server_id: ServerId) -> ServerStoreResult<Option<Server>> {
        let state = self.read_state()?;
        Ok(state.servers.get(&server_id).cloned())
    }

    fn read_state(&self) -> ServerStoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        let state = self
            .state
            .read()
            .map_err(|err| ServerStoreError::persistence(std::io::Error::other(err.to_string())))?;
        ensure_available(&state)?;
        Ok(state)
    }

    fn write_state(&self) -> ServerStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        let state = self.write_state_unchecked()?;
        ensure_available(&state)?;
        Ok(state)
    }

    fn write_state_unchecked(&self) -> ServerStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state
            .write()
            .map_err(|err| ServerStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

fn ensure_available(state: &InMemoryStoreState) -> ServerStoreResult<()> {
    if state.unavailable {
        return Err(ServerStoreError::persistence(std::io::Error::new(
            std::io::ErrorKind::NotConnected,
            "server store unavailable",
        )));
    }
    Ok(())
}

fn live_record_at(
    state: &InMemoryStoreState,
    server_id: ServerId,
    expected_version: u64,
) -> Option<&Server> {
    state
        .servers
        .get(&server_id)
        .filter(|stored| !stored.is_deleted() && stored.version() == expected_version)
}

#[async_trait]
impl ServerStore for InMemoryServerStore {
    async fn insert(&self, server: &Server) -> ServerStoreResult<()> {
        let mut state = self.write_state()?;

        if state.servers.contains_key(&server.id()) {
            return Err(ServerStoreError::DuplicateServer(server.id()));
        }

        state.servers.insert(server.id(), server.clone());
        Ok(())
    }

    async fn load(&self, server_id: ServerId) -> ServerStoreResult<Option<Server>> {
        let state = self.read_state()?;
        Ok(state
            .servers
            .get(&server_id)
            .filter(|stored| !stored.is_deleted())
            .cloned())
    }

    async fn compare_and_swap(
        &self,
        server_id: ServerId,
        expected_version: u64,
        server: &Server,
    ) -> ServerStoreResult<bool> {
        let mut state = self.write_state()?;

        if state.injected_conflicts > 0 {
            state.injected_conflicts -= 1;
            return Ok(false);
        }

        if live_record_at(&state, server_id, expected_version).is_none() {
            return Ok(false);
        }

        state.servers.insert(server_id, server.clone());
        Ok(true)
    }

    async fn claim_for_testing(
        &self,
        server_id: ServerId,
        expected_version: u64,
    ) -> ServerStoreResult<bool> {
        let mut state = self.write_state()?;

        let Some(stored) = state
            .servers
            .get_mut(&server_id)
            .filter(|stored| !stored.is_deleted() && stored.version() == expected_version)
        else {
            return Ok(false);
        };

        Ok(stored.claim_for_testing().is_ok())
    }

    async fn list_by_project(&self, project_id: ProjectId) -> ServerStoreResult<Vec<Server>> {
        let state = self.read_state()?;
        let mut servers: Vec<Server> = state
            .servers
            .values()
            .filter(|server| server.project_id() == project_id && !server.is_deleted())
            .cloned()
            .collect();
        servers.sort_by(|left, right| {
            left.order()
                .cmp(&right.order())
                .then_with(|| left.name().as_str().cmp(right.name().as_str()))
        });
        Ok(servers)
    }
}
