//! Domain model for managed servers and their verification lifecycle.
//!
//! The server domain models connection details, the verification status
//! machine, and the rule that connection edits invalidate prior
//! verification. Storage, notification, and probing remain outside this
//! boundary.

mod connection;
mod error;
mod guard;
mod ids;
mod server;
mod status;

pub use connection::{ConnectionDetails, ConnectionEdit, ConnectionField, clean_path};
pub use error::{ParseVerificationStatusError, ServerDomainError};
pub use guard::{GuardedEdit, apply_edit};
pub use ids::{ProjectId, ServerId, ServerName};
pub use server::{PersistedServerData, Server};
pub use status::{ProbeOutcome, VerificationStatus};
