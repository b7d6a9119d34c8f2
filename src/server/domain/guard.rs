//! Invalidation of prior verification on connection edits.

use super::{ConnectionEdit, Server, VerificationStatus};

/// Result of applying a connection edit to a server record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedEdit {
    server: Server,
    value_changed: bool,
    previous_status: VerificationStatus,
}

impl GuardedEdit {
    /// Returns the edited record.
    #[must_use]
    pub const fn server(&self) -> &Server {
        &self.server
    }

    /// Consumes the edit and returns the edited record.
    #[must_use]
    pub fn into_server(self) -> Server {
        self.server
    }

    /// Returns whether the stored value differed from the new one.
    #[must_use]
    pub const fn value_changed(&self) -> bool {
        self.value_changed
    }

    /// Returns the status held before the edit.
    #[must_use]
    pub const fn previous_status(&self) -> VerificationStatus {
        self.previous_status
    }

    /// Returns whether the edit changed the verification status.
    #[must_use]
    pub fn status_changed(&self) -> bool {
        self.previous_status != self.server.status()
    }
}

/// Writes `edit` into `server`, forcing `untested` when the value changed.
///
/// The status reset happens on the same value as the attribute write, so no
/// reader can observe new connection details alongside a stale status. A
/// missing prior value counts as a change. The new value is written even
/// when unchanged. Persistence is left to the caller.
#[must_use]
pub fn apply_edit(mut server: Server, edit: ConnectionEdit) -> GuardedEdit {
    let previous_status = server.status();
    let value_changed = server.write_connection(edit);
    GuardedEdit {
        server,
        value_changed,
        previous_status,
    }
}
