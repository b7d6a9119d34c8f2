//! Fixhub: deployment target tracking.
//!
//! This crate tracks the servers a project deploys to, together with whether
//! their connection details have been verified reachable. Editing connection
//! details invalidates earlier verification, and concurrent verification
//! probes never apply a result over a newer edit.
//!
//! # Architecture
//!
//! Fixhub follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, network, etc.)
//!
//! # Modules
//!
//! - [`server`]: Managed servers, connection edits, and verification

pub mod server;
