//! Port contracts for server storage, notification, and probing.

mod notifier;
mod probe;
mod store;

pub use notifier::{ChangeNotifier, ChangeNotifierError, ChangeNotifierResult, StatusChange};
pub use probe::{ConnectivityProbe, ProbeError, ProbeReport, ProbeResult};
pub use store::{ServerStore, ServerStoreError, ServerStoreResult};
