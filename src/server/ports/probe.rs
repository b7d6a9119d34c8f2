//! Connectivity probe port used during verification.

use crate::server::domain::{ProbeOutcome, Server};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for connectivity probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Outcome and diagnostic text produced by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    /// Whether the server was reachable.
    pub outcome: ProbeOutcome,
    /// Diagnostic output stored on the server record.
    pub output: String,
}

impl ProbeReport {
    /// Creates a successful report.
    #[must_use]
    pub fn successful(output: impl Into<String>) -> Self {
        Self {
            outcome: ProbeOutcome::Successful,
            output: output.into(),
        }
    }

    /// Creates a failed report.
    #[must_use]
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            outcome: ProbeOutcome::Failed,
            output: output.into(),
        }
    }
}

/// External connectivity check run against a server's connection details.
///
/// Unreachable servers are reported as [`ProbeOutcome::Failed`], not as
/// errors. [`ProbeError`] is reserved for the probe runner itself breaking.
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Checks whether the server is reachable.
    async fn probe(&self, server: &Server) -> ProbeResult<ProbeReport>;
}

/// Errors returned by connectivity probe adapters.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// Generic probe runtime failure.
    #[error("connectivity probe runtime error: {0}")]
    Runtime(Arc<dyn std::error::Error + Send + Sync>),
}

impl ProbeError {
    /// Wraps a runtime error from the probe adapter.
    pub fn runtime(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Runtime(Arc::new(err))
    }
}
