//! Application services for server management and verification.

mod config;
mod error;
mod management;
mod revision;
mod verification;

pub use config::{
    DEFAULT_MAX_CONFLICT_RETRIES, DEFAULT_NOTIFY_TIMEOUT, DEFAULT_PROBE_TIMEOUT, ServerServiceConfig,
};
pub use error::{ServerServiceError, ServerServiceResult};
pub use management::{CreateServerRequest, ServerManagementService};
pub use revision::EditOutcome;
pub use verification::{CompletionOutcome, VerificationCoordinator, VerificationProbe};
