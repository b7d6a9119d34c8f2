//! Diesel row models for managed server persistence.

use super::schema::servers;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for server records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Owning project identifier.
    pub project_id: uuid::Uuid,
    /// Server name.
    pub name: String,
    /// Login identity.
    pub login_user: Option<String>,
    /// Host name or address.
    pub ip_address: Option<String>,
    /// Deploy root.
    pub path: Option<String>,
    /// SSH port.
    pub port: Option<i32>,
    /// Deploy-code flag.
    pub deploy_code: bool,
    /// Ordering within the project.
    pub sort_order: i32,
    /// Verification status.
    pub status: String,
    /// Last verification output.
    pub output: Option<String>,
    /// Revision counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert model for server records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = servers)]
pub struct NewServerRow {
    /// Internal server identifier.
    pub id: uuid::Uuid,
    /// Owning project identifier.
    pub project_id: uuid::Uuid,
    /// Server name.
    pub name: String,
    /// Login identity.
    pub login_user: Option<String>,
    /// Host name or address.
    pub ip_address: Option<String>,
    /// Deploy root.
    pub path: Option<String>,
    /// SSH port.
    pub port: Option<i32>,
    /// Deploy-code flag.
    pub deploy_code: bool,
    /// Ordering within the project.
    pub sort_order: i32,
    /// Verification status.
    pub status: String,
    /// Last verification output.
    pub output: Option<String>,
    /// Revision counter.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-deletion timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}
