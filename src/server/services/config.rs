//! Tunables shared by the server services.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of attempts for a conditional write.
pub const DEFAULT_MAX_CONFLICT_RETRIES: usize = 3;

/// Default upper bound on a single connectivity probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Default upper bound on delivering one status change notification.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for server management and verification.
///
/// Durations accept human-readable values such as `"500ms"` or `"2m"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerServiceConfig {
    /// Attempts made when a compare-and-swap loses to a concurrent writer,
    /// before surfacing a storage conflict.
    pub max_conflict_retries: usize,

    /// Time a probe may run before it counts as failed.
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,

    /// Time a status change notification may take before it is dropped.
    /// The change itself is already stored by then.
    #[serde(with = "humantime_serde")]
    pub notify_timeout: Duration,
}

impl Default for ServerServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl ServerServiceConfig {
    /// Sets the number of conflict retries.
    #[must_use]
    pub const fn with_max_conflict_retries(mut self, max_conflict_retries: usize) -> Self {
        self.max_conflict_retries = max_conflict_retries;
        self
    }

    /// Sets the probe timeout.
    #[must_use]
    pub const fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }

    /// Sets the notification delivery timeout.
    #[must_use]
    pub const fn with_notify_timeout(mut self, notify_timeout: Duration) -> Self {
        self.notify_timeout = notify_timeout;
        self
    }

    /// Returns the number of write attempts, never less than one.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.max_conflict_retries.max(1)
    }
}
