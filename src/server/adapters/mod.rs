//! Adapter implementations for server storage, notification, and probing.

pub mod memory;
pub mod postgres;

mod audit;
mod tcp;

pub use audit::TracingChangeNotifier;
pub use tcp::{DEFAULT_SSH_PORT, TcpConnectivityProbe};
