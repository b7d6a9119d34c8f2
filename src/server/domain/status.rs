//! Verification status of a managed server and its legal transitions.

use super::ParseVerificationStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse verification status of a server's connection details.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// The last verification probe reached and validated the server.
    Successful,
    /// Connection details changed, or were never verified.
    #[default]
    Untested,
    /// The last verification probe failed.
    Failed,
    /// A verification probe is in flight.
    Testing,
}

impl VerificationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Untested => "untested",
            Self::Failed => "failed",
            Self::Testing => "testing",
        }
    }

    /// Returns whether a probe is in flight.
    #[must_use]
    pub const fn is_testing(self) -> bool {
        matches!(self, Self::Testing)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// `untested` is reachable from every state. `successful` and `failed`
    /// are reachable only from `testing`; whether the probe result is still
    /// current is decided by the caller's staleness check.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (_, Self::Untested)
                | (Self::Untested | Self::Successful | Self::Failed, Self::Testing)
                | (Self::Testing, Self::Successful | Self::Failed)
        )
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for VerificationStatus {
    type Error = ParseVerificationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "successful" => Ok(Self::Successful),
            "untested" => Ok(Self::Untested),
            "failed" => Ok(Self::Failed),
            "testing" => Ok(Self::Testing),
            _ => Err(ParseVerificationStatusError(value.to_owned())),
        }
    }
}

/// Terminal result of a verification probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// The server was reachable and usable.
    Successful,
    /// The server could not be reached or validated.
    Failed,
}

impl ProbeOutcome {
    /// Returns the status a server takes when this outcome is applied.
    #[must_use]
    pub const fn status(self) -> VerificationStatus {
        match self {
            Self::Successful => VerificationStatus::Successful,
            Self::Failed => VerificationStatus::Failed,
        }
    }
}
