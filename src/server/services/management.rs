//! Service layer for creating and editing managed servers.

use super::{
    ServerServiceConfig, ServerServiceError, ServerServiceResult,
    revision::{EditOutcome, Reviser},
};
use crate::server::{
    domain::{
        ConnectionEdit, ConnectionField, ProjectId, Server, ServerId, ServerName, apply_edit,
    },
    ports::{ChangeNotifier, ServerStore},
};
use mockable::Clock;
use std::sync::Arc;

/// Request payload for creating a server.
///
/// Connection values are raw caller input and are coerced during creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateServerRequest {
    project_id: ProjectId,
    name: String,
    user: Option<String>,
    ip_address: Option<String>,
    path: Option<String>,
    port: Option<String>,
    deploy_code: bool,
    order: u32,
}

impl CreateServerRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(project_id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            user: None,
            ip_address: None,
            path: None,
            port: None,
            deploy_code: true,
            order: 0,
        }
    }

    /// Sets the login identity.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the host name or address.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    /// Sets the deploy path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the SSH port from raw input.
    #[must_use]
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets whether code is deployed to the server.
    #[must_use]
    pub const fn with_deploy_code(mut self, deploy_code: bool) -> Self {
        self.deploy_code = deploy_code;
        self
    }

    /// Sets the ordering position within the project.
    #[must_use]
    pub const fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    fn connection_edits(&self) -> ServerServiceResult<Vec<ConnectionEdit>> {
        [
            (ConnectionField::User, self.user.as_deref()),
            (ConnectionField::IpAddress, self.ip_address.as_deref()),
            (ConnectionField::Path, self.path.as_deref()),
            (ConnectionField::Port, self.port.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, raw)| raw.map(|value| ConnectionEdit::parse(field, value)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(ServerServiceError::from)
    }
}

/// Server creation, editing, and removal service.
///
/// Every edit is a conditional write against the record's version. Edits
/// to connection attributes reset the verification status in the same
/// write.
#[derive(Clone)]
pub struct ServerManagementService<S, N, C>
where
    S: ServerStore,
    N: ChangeNotifier,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    notifier: Arc<N>,
    clock: Arc<C>,
    config: ServerServiceConfig,
}

impl<S, N, C> ServerManagementService<S, N, C>
where
    S: ServerStore,
    N: ChangeNotifier,
    C: Clock + Send + Sync,
{
    /// Creates a management service with default configuration.
    #[must_use]
    pub fn new(store: Arc<S>, notifier: Arc<N>, clock: Arc<C>) -> Self {
        Self {
            store,
            notifier,
            clock,
            config: ServerServiceConfig::default(),
        }
    }

    /// Replaces the service configuration.
    #[must_use]
    pub const fn with_config(mut self, config: ServerServiceConfig) -> Self {
        self.config = config;
        self
    }

    fn reviser(&self) -> Reviser<'_, S, N, C> {
        Reviser {
            store: &*self.store,
            notifier: &*self.notifier,
            clock: &*self.clock,
            attempts: self.config.attempts(),
            notify_timeout: self.config.notify_timeout,
        }
    }

    /// Creates a new `untested` server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::Domain`] when the name or a connection
    /// value is invalid, and store errors when persistence fails. Nothing is
    /// stored on error.
    pub async fn create(&self, request: CreateServerRequest) -> ServerServiceResult<Server> {
        let edits = request.connection_edits()?;
        let name = ServerName::new(request.name)?;

        let mut draft = Server::new(request.project_id, name, &*self.clock);
        draft.set_deploy_code(request.deploy_code);
        draft.set_order(request.order);
        let server = edits
            .into_iter()
            .fold(draft, |current, edit| apply_edit(current, edit).into_server());

        self.store.insert(&server).await?;
        Ok(server)
    }

    /// Finds a live server.
    ///
    /// # Errors
    ///
    /// Returns store errors when the lookup fails.
    pub async fn find(&self, server_id: ServerId) -> ServerServiceResult<Option<Server>> {
        Ok(self.store.load(server_id).await?)
    }

    /// Lists live servers of a project in deploy order.
    ///
    /// # Errors
    ///
    /// Returns store errors when the listing fails.
    pub async fn list_for_project(&self, project_id: ProjectId) -> ServerServiceResult<Vec<Server>> {
        Ok(self.store.list_by_project(project_id).await?)
    }

    /// Sets one connection attribute from raw input.
    ///
    /// A changed value (or one set for the first time) forces the status to
    /// `untested` in the same write. An unchanged value writes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::Domain`] with
    /// `InvalidFieldValue` before any write when the value cannot be
    /// coerced, [`ServerServiceError::NotFound`] for unknown servers, and
    /// [`ServerServiceError::StorageConflict`] when concurrent writers win
    /// every attempt.
    pub async fn edit_connection(
        &self,
        server_id: ServerId,
        field: ConnectionField,
        raw_value: &str,
    ) -> ServerServiceResult<EditOutcome> {
        let edit = ConnectionEdit::parse(field, raw_value)?;
        self.reviser()
            .revise(server_id, |server| {
                let guarded = apply_edit(server, edit.clone());
                let changed = guarded.value_changed();
                Ok((guarded.into_server(), changed))
            })
            .await
    }

    /// Renames a server.
    ///
    /// # Errors
    ///
    /// Returns domain errors for invalid names, plus the errors of
    /// [`Self::edit_connection`].
    pub async fn rename(
        &self,
        server_id: ServerId,
        name: impl Into<String>,
    ) -> ServerServiceResult<EditOutcome> {
        let validated = ServerName::new(name)?;
        self.reviser()
            .revise(server_id, |mut server| {
                let changed = server.rename(validated.clone());
                Ok((server, changed))
            })
            .await
    }

    /// Sets whether code is deployed to a server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::NotFound`] for unknown servers and
    /// [`ServerServiceError::StorageConflict`] when concurrent writers win
    /// every attempt.
    pub async fn set_deploy_code(
        &self,
        server_id: ServerId,
        deploy_code: bool,
    ) -> ServerServiceResult<EditOutcome> {
        self.reviser()
            .revise(server_id, |mut server| {
                let changed = server.set_deploy_code(deploy_code);
                Ok((server, changed))
            })
            .await
    }

    /// Assigns consecutive positions to servers in the given order.
    ///
    /// Returns the project's servers in their new order.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::WrongProject`] when an identifier
    /// belongs to another project. Positions assigned before the failing
    /// server are kept.
    pub async fn reorder(
        &self,
        project_id: ProjectId,
        ordered_ids: &[ServerId],
    ) -> ServerServiceResult<Vec<Server>> {
        for (position, server_id) in (0_u32..).zip(ordered_ids.iter().copied()) {
            self.reviser()
                .revise(server_id, |mut server| {
                    if server.project_id() != project_id {
                        return Err(ServerServiceError::WrongProject {
                            server_id,
                            project_id,
                        });
                    }
                    let changed = server.set_order(position);
                    Ok((server, changed))
                })
                .await?;
        }

        self.list_for_project(project_id).await
    }

    /// Soft-deletes a server.
    ///
    /// The record is retained but no longer loaded or listed. The deletion
    /// is a new revision, so pending verification results for it are
    /// discarded and a `testing` status is released.
    ///
    /// # Errors
    ///
    /// Returns [`ServerServiceError::NotFound`] when no live server exists,
    /// [`ServerServiceError::StorageConflict`], and store errors.
    pub async fn delete(&self, server_id: ServerId) -> ServerServiceResult<EditOutcome> {
        let clock = &*self.clock;
        self.reviser()
            .revise(server_id, |mut server| {
                server.mark_deleted(clock);
                Ok((server, true))
            })
            .await
    }
}
