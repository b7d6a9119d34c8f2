//! In-memory adapters for server storage, notification, and probing.

mod notifier;
mod probe;
mod store;

pub use notifier::InMemoryChangeNotifier;
pub use probe::InMemoryConnectivityProbe;
pub use store::InMemoryServerStore;
