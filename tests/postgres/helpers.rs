//! Shared test helpers for `PostgreSQL` store integration tests.

use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use fixhub::server::{
    adapters::postgres::{PostgresServerStore, ServerPgPool},
    domain::{
        ConnectionDetails, PersistedServerData, ProjectId, Server, ServerId, ServerName,
        VerificationStatus,
    },
};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;

/// SQL creating the `servers` table.
const CREATE_SERVERS_SQL: &str =
    include_str!("../../migrations/2026-10-19-000000_create_servers/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "fixhub_test_template";

/// Creates a tokio runtime for async store calls in tests.
pub fn test_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create test runtime")
}

/// Ensures the template database exists with the schema applied.
fn ensure_template(cluster: &TestCluster) {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            execute_sql_statements(&mut conn, CREATE_SERVERS_SQL)?;
            Ok(())
        })
        .expect("template setup");
}

/// Executes each non-empty statement of a migration file.
fn execute_sql_statements(conn: &mut PgConnection, sql: &str) -> eyre::Result<()> {
    for statement in sql.split(';') {
        let trimmed = statement.trim();
        if trimmed.is_empty() || trimmed.lines().all(|line| line.trim().starts_with("--")) {
            continue;
        }
        diesel::sql_query(trimmed)
            .execute(conn)
            .map_err(|e| eyre::eyre!("SQL error: {e}\nStatement: {trimmed}"))?;
    }
    Ok(())
}

/// Per-test database dropped when the guard goes out of scope.
pub struct TestDatabase {
    cluster: &'static TestCluster,
    name: String,
}

impl TestDatabase {
    /// Creates a migrated database for one test.
    pub fn create(cluster: &'static TestCluster, prefix: &str) -> Self {
        ensure_template(cluster);
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .expect("database should be created from template");
        Self { cluster, name }
    }

    /// Returns the connection URL of the database.
    pub fn url(&self) -> String {
        self.cluster.connection().database_url(&self.name)
    }

    /// Builds a store over a single-connection pool.
    pub fn store(&self) -> PostgresServerStore {
        let manager = ConnectionManager::<PgConnection>::new(self.url());
        let pool: ServerPgPool = Pool::builder()
            .max_size(1)
            .build(manager)
            .expect("pool should build");
        PostgresServerStore::new(pool)
    }

    /// Reads the raw version and deletion marker of a row, deleted or not.
    pub fn raw_row(&self, server_id: ServerId) -> RawServerRow {
        let mut conn = PgConnection::establish(&self.url()).expect("connection should open");
        diesel::sql_query(concat!(
            "SELECT version, deleted_at IS NOT NULL AS deleted, status ",
            "FROM servers WHERE id = $1",
        ))
        .bind::<diesel::sql_types::Uuid, _>(server_id.into_inner())
        .get_result::<RawServerRow>(&mut conn)
        .expect("row should exist")
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        if let Err(e) = self.cluster.drop_database(self.name.as_str()) {
            eprintln!("Warning: failed to drop test database {}: {e}", self.name);
        }
    }
}

/// Row columns read past the store's live-record filter.
#[derive(diesel::QueryableByName, Debug)]
pub struct RawServerRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub version: i64,
    #[diesel(sql_type = diesel::sql_types::Bool)]
    pub deleted: bool,
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub status: String,
}

/// Builds a fully configured server record at the given status and version.
pub fn seeded_server(status: VerificationStatus, version: u64) -> Server {
    let timestamp = Utc::now();
    Server::from_persisted(PersistedServerData {
        id: ServerId::new(),
        project_id: ProjectId::new(),
        name: ServerName::new("web-01").expect("valid server name"),
        connection: ConnectionDetails {
            user: Some("deploy".to_owned()),
            ip_address: Some("10.0.0.5".to_owned()),
            path: Some("/a/b/".to_owned()),
            port: Some(22),
        },
        deploy_code: true,
        order: 0,
        status,
        output: None,
        version,
        created_at: timestamp,
        updated_at: timestamp,
        deleted_at: None,
    })
}
