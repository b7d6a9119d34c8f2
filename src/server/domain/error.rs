//! Error types for server domain validation and status transitions.

use super::ServerId;
use thiserror::Error;

/// Errors returned while constructing or mutating server domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServerDomainError {
    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name exceeds the 255-character storage limit.
    #[error("server name exceeds 255 character limit: {0}")]
    ServerNameTooLong(String),

    /// The field name does not identify a connection attribute.
    #[error("unknown connection field: {0}")]
    UnknownField(String),

    /// The raw value cannot be coerced into the field's type.
    #[error("invalid value '{value}' for field {field}")]
    InvalidFieldValue {
        /// Connection field in canonical string form.
        field: String,
        /// Raw value as supplied by the caller.
        value: String,
    },

    /// A verification probe is already in flight for the server.
    #[error("server {0} is already being tested")]
    AlreadyTesting(ServerId),

    /// Transitioning between two verification statuses is invalid.
    #[error("invalid verification status transition: {from} -> {to}")]
    InvalidStatusTransition {
        /// Current status.
        from: String,
        /// Requested target status.
        to: String,
    },
}

/// Error returned while parsing verification status from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown verification status: {0}")]
pub struct ParseVerificationStatusError(pub String);
