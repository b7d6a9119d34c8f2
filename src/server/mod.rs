//! Managed servers and their connection verification.
//!
//! A server records how a deploy target is reached and whether those
//! details were last verified reachable. Editing any connection attribute
//! invalidates prior verification, and verification results are discarded
//! when the record changed while the probe ran. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
