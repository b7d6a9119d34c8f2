//! `PostgreSQL` adapters for managed server persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresServerStore, ServerPgPool};
