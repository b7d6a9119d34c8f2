//! Scripted in-memory connectivity probe.

use crate::server::{
    domain::{Server, ServerId},
    ports::{ConnectivityProbe, ProbeError, ProbeReport, ProbeResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Notify;

/// Connectivity probe whose results are scripted per server.
///
/// Servers without a script are reported reachable. A probe can be held at
/// its start until released, which lets tests interleave edits with an
/// in-flight verification deterministically.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectivityProbe {
    state: Arc<RwLock<ProbeState>>,
    gate: Arc<Notify>,
}

#[derive(Debug, Default)]
struct ProbeState {
    reports: HashMap<ServerId, ProbeReport>,
    runtime_errors: HashMap<ServerId, String>,
    delay: Option<Duration>,
    held: bool,
    calls: usize,
}

impl InMemoryConnectivityProbe {
    /// Creates a probe that reports every server reachable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the report returned for a server.
    ///
    /// # Errors
    ///
    /// Returns probe runtime errors when lock acquisition fails.
    pub fn set_report(&self, server_id: ServerId, report: ProbeReport) -> ProbeResult<()> {
        self.with_state(|state| {
            state.runtime_errors.remove(&server_id);
            state.reports.insert(server_id, report);
        })
    }

    /// Scripts a probe runner failure for a server.
    ///
    /// # Errors
    ///
    /// Returns probe runtime errors when lock acquisition fails.
    pub fn set_runtime_error(
        &self,
        server_id: ServerId,
        message: impl Into<String>,
    ) -> ProbeResult<()> {
        let text = message.into();
        self.with_state(|state| {
            state.runtime_errors.insert(server_id, text);
        })
    }

    /// Delays every probe by `delay` before reporting.
    ///
    /// # Errors
    ///
    /// Returns probe runtime errors when lock acquisition fails.
    pub fn set_delay(&self, delay: Duration) -> ProbeResult<()> {
        self.with_state(|state| state.delay = Some(delay))
    }

    /// Holds subsequent probes at their start until [`Self::release`].
    ///
    /// # Errors
    ///
    /// Returns probe runtime errors when lock acquisition fails.
    pub fn hold(&self) -> ProbeResult<()> {
        self.with_state(|state| state.held = true)
    }

    /// Lets one held probe continue.
    ///
    /// A release issued before the probe starts waiting is kept, so the
    /// next held probe continues immediately.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    /// Returns how many probes have started.
    ///
    /// # Errors
    ///
    /// Returns probe runtime errors when lock acquisition fails.
    pub fn calls(&self) -> ProbeResult<usize> {
        let state = self
            .state
            .read()
            .map_err(|err| ProbeError::runtime(std::io::Error::other(err.to_string())))?;
        Ok(state.calls)
    }

    fn with_state(&self, update: impl FnOnce(&mut ProbeState)) -> ProbeResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ProbeError::runtime(std::io::Error::other(err.to_string())))?;
        update(&mut state);
        Ok(())
    }
}

struct ScriptedRun {
    report: Option<ProbeReport>,
    runtime_error: Option<String>,
    delay: Option<Duration>,
    held: bool,
}

#[async_trait]
impl ConnectivityProbe for InMemoryConnectivityProbe {
    async fn probe(&self, server: &Server) -> ProbeResult<ProbeReport> {
        let run = {
            let mut state = self
                .state
                .write()
                .map_err(|err| ProbeError::runtime(std::io::Error::other(err.to_string())))?;
            state.calls += 1;
            ScriptedRun {
                report: state.reports.get(&server.id()).cloned(),
                runtime_error: state.runtime_errors.get(&server.id()).cloned(),
                delay: state.delay,
                held: state.held,
            }
        };

        if run.held {
            self.gate.notified().await;
        }
        if let Some(delay) = run.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = run.runtime_error {
            return Err(ProbeError::runtime(std::io::Error::other(message)));
        }

        Ok(run
            .report
            .unwrap_or_else(|| ProbeReport::successful(format!("reached {}", server.name()))))
    }
}
