//! Managed server aggregate root.

use super::{
    ConnectionDetails, ConnectionEdit, ProbeOutcome, ProjectId, ServerDomainError, ServerId,
    ServerName, VerificationStatus, clean_path,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;

/// Managed server aggregate root.
///
/// The record tracks how a deploy target is reached and whether those
/// connection details have been verified. `version` counts persisted
/// revisions and backs the staleness guard applied to probe results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Server {
    id: ServerId,
    project_id: ProjectId,
    name: ServerName,
    #[serde(flatten)]
    connection: ConnectionDetails,
    deploy_code: bool,
    order: u32,
    status: VerificationStatus,
    output: Option<String>,
    version: u64,
    #[serde(skip_serializing)]
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    deleted_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing persisted server state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted server identifier.
    pub id: ServerId,
    /// Persisted owning project.
    pub project_id: ProjectId,
    /// Persisted server name.
    pub name: ServerName,
    /// Persisted connection attributes.
    pub connection: ConnectionDetails,
    /// Persisted deploy-code flag.
    pub deploy_code: bool,
    /// Persisted ordering within the project.
    pub order: u32,
    /// Persisted verification status.
    pub status: VerificationStatus,
    /// Persisted output of the last verification.
    pub output: Option<String>,
    /// Persisted revision counter.
    pub version: u64,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Server {
    /// Version assigned to freshly created records.
    pub const INITIAL_VERSION: u64 = 1;

    /// Creates a new server with no connection details.
    ///
    /// New servers deploy code, sort first, and start `untested`.
    #[must_use]
    pub fn new(project_id: ProjectId, name: ServerName, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: ServerId::new(),
            project_id,
            name,
            connection: ConnectionDetails::default(),
            deploy_code: true,
            order: 0,
            status: VerificationStatus::Untested,
            output: None,
            version: Self::INITIAL_VERSION,
            created_at: timestamp,
            updated_at: timestamp,
            deleted_at: None,
        }
    }

    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            project_id: data.project_id,
            name: data.name,
            connection: data.connection,
            deploy_code: data.deploy_code,
            order: data.order,
            status: data.status,
            output: data.output,
            version: data.version,
            created_at: data.created_at,
            updated_at: data.updated_at,
            deleted_at: data.deleted_at,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns all connection attributes.
    #[must_use]
    pub const fn connection(&self) -> &ConnectionDetails {
        &self.connection
    }

    /// Returns the login identity, if set.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.connection.user.as_deref()
    }

    /// Returns the host name or address, if set.
    #[must_use]
    pub fn ip_address(&self) -> Option<&str> {
        self.connection.ip_address.as_deref()
    }

    /// Returns the deploy path exactly as stored, if set.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.connection.path.as_deref()
    }

    /// Returns the deploy path without trailing separators, if set.
    #[must_use]
    pub fn clean_path(&self) -> Option<&str> {
        self.path().map(clean_path)
    }

    /// Returns the SSH port, if set.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.connection.port
    }

    /// Returns whether code is deployed to this server.
    #[must_use]
    pub const fn deploy_code(&self) -> bool {
        self.deploy_code
    }

    /// Returns the ordering position within the project.
    #[must_use]
    pub const fn order(&self) -> u32 {
        self.order
    }

    /// Returns the verification status.
    #[must_use]
    pub const fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Returns whether a verification probe is in flight.
    #[must_use]
    pub const fn is_testing(&self) -> bool {
        self.status.is_testing()
    }

    /// Returns the output of the last verification, if any.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Returns the revision counter.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the soft-deletion timestamp, if deleted.
    #[must_use]
    pub const fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    /// Returns whether the server has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Replaces the server name. Returns `true` when the name changed.
    pub fn rename(&mut self, name: ServerName) -> bool {
        if self.name == name {
            return false;
        }
        self.name = name;
        true
    }

    /// Sets the deploy-code flag. Returns `true` when the flag changed.
    pub const fn set_deploy_code(&mut self, deploy_code: bool) -> bool {
        if self.deploy_code == deploy_code {
            return false;
        }
        self.deploy_code = deploy_code;
        true
    }

    /// Sets the ordering position. Returns `true` when the position changed.
    pub const fn set_order(&mut self, order: u32) -> bool {
        if self.order == order {
            return false;
        }
        self.order = order;
        true
    }

    /// Claims the server for a verification probe.
    ///
    /// The version is left untouched so that the probe can capture it.
    /// Returns the status held before the claim.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::AlreadyTesting`] when a probe is already
    /// in flight.
    pub fn claim_for_testing(&mut self) -> Result<VerificationStatus, ServerDomainError> {
        if self.status.is_testing() {
            return Err(ServerDomainError::AlreadyTesting(self.id));
        }
        let previous = self.status;
        self.transition_to(VerificationStatus::Testing)?;
        Ok(previous)
    }

    /// Applies a probe outcome and stages a new revision.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::InvalidStatusTransition`] when the server
    /// is not being tested.
    pub fn record_outcome(
        &mut self,
        outcome: ProbeOutcome,
        output: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), ServerDomainError> {
        self.transition_to(outcome.status())?;
        self.output = Some(output.into());
        self.stage_revision(clock);
        Ok(())
    }

    /// Releases an abandoned probe, restoring the pre-probe status.
    ///
    /// # Errors
    ///
    /// Returns [`ServerDomainError::InvalidStatusTransition`] when the server
    /// is not being tested or `previous` is itself `testing`.
    pub fn release_probe(
        &mut self,
        previous: VerificationStatus,
        clock: &impl Clock,
    ) -> Result<(), ServerDomainError> {
        if !self.status.is_testing() || previous.is_testing() {
            return Err(ServerDomainError::InvalidStatusTransition {
                from: self.status.as_str().to_owned(),
                to: previous.as_str().to_owned(),
            });
        }
        self.status = previous;
        self.stage_revision(clock);
        Ok(())
    }

    /// Forces the status back to `untested`.
    pub const fn mark_untested(&mut self) {
        self.status = VerificationStatus::Untested;
    }

    /// Marks the server as soft-deleted.
    ///
    /// The deletion is written like any other revision.
    pub fn mark_deleted(&mut self, clock: &impl Clock) {
        self.deleted_at = Some(clock.utc());
    }

    /// Prepares the record for a conditional write: bumps the version and
    /// the update timestamp.
    ///
    /// A staged revision is never `testing`. A probe in flight against the
    /// previous version would have its result discarded, so the status is
    /// forced to `untested`.
    pub fn stage_revision(&mut self, clock: &impl Clock) {
        if self.status.is_testing() {
            self.mark_untested();
        }
        self.version = self.version.saturating_add(1);
        self.updated_at = clock.utc();
    }

    /// Writes a connection attribute, resetting the status when it changed.
    pub(super) fn write_connection(&mut self, edit: ConnectionEdit) -> bool {
        let changed = self.connection.write(edit);
        if changed {
            self.mark_untested();
        }
        changed
    }

    fn transition_to(&mut self, target: VerificationStatus) -> Result<(), ServerDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(ServerDomainError::InvalidStatusTransition {
                from: self.status.as_str().to_owned(),
                to: target.as_str().to_owned(),
            });
        }

        self.status = target;
        Ok(())
    }
}
