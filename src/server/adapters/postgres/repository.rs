//! `PostgreSQL` store implementation for managed server records.

use super::{
    models::{NewServerRow, ServerRow},
    schema::servers,
};
use crate::server::{
    domain::{
        ConnectionDetails, PersistedServerData, ProjectId, Server, ServerId, ServerName,
        VerificationStatus,
    },
    ports::{ServerStore, ServerStoreError, ServerStoreResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type for server adapters.
pub type ServerPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed store for server records.
///
/// Conditional writes are single `UPDATE` statements filtered on `version`,
/// so each one is atomic without explicit row locks. Soft deletion is a
/// swapped-in record carrying `deleted_at`.
#[derive(Debug, Clone)]
pub struct PostgresServerStore {
    pool: ServerPgPool,
}

impl PostgresServerStore {
    /// Creates a new store from a `PostgreSQL` pool.
    #[must_use]
    pub const fn new(pool: ServerPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, operation: F) -> ServerStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ServerStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ServerStoreError::persistence)?;
            operation(&mut connection)
        })
        .await
        .map_err(ServerStoreError::persistence)?
    }
}

#[async_trait]
impl ServerStore for PostgresServerStore {
    async fn insert(&self, server: &Server) -> ServerStoreResult<()> {
        let server_id = server.id();
        let new_row = to_new_row(server)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(servers::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        ServerStoreError::DuplicateServer(server_id)
                    }
                    _ => ServerStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn load(&self, server_id: ServerId) -> ServerStoreResult<Option<Server>> {
        self.run_blocking(move |connection| {
            let row = servers::table
                .filter(servers::id.eq(server_id.into_inner()))
                .filter(servers::deleted_at.is_null())
                .select(ServerRow::as_select())
                .first::<ServerRow>(connection)
                .optional()
                .map_err(ServerStoreError::persistence)?;
            row.map(row_to_server).transpose()
        })
        .await
    }

    async fn compare_and_swap(
        &self,
        server_id: ServerId,
        expected_version: u64,
        server: &Server,
    ) -> ServerStoreResult<bool> {
        let expected = to_db_version(expected_version)?;
        let row = to_new_row(server)?;

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                servers::table
                    .filter(servers::id.eq(server_id.into_inner()))
                    .filter(servers::version.eq(expected))
                    .filter(servers::deleted_at.is_null()),
            )
            .set((
                servers::name.eq(&row.name),
                servers::login_user.eq(&row.login_user),
                servers::ip_address.eq(&row.ip_address),
                servers::path.eq(&row.path),
                servers::port.eq(row.port),
                servers::deploy_code.eq(row.deploy_code),
                servers::sort_order.eq(row.sort_order),
                servers::status.eq(&row.status),
                servers::output.eq(&row.output),
                servers::version.eq(row.version),
                servers::updated_at.eq(row.updated_at),
                servers::deleted_at.eq(row.deleted_at),
            ))
            .execute(connection)
            .map_err(ServerStoreError::persistence)?;
            Ok(updated_count == 1)
        })
        .await
    }

    async fn claim_for_testing(
        &self,
        server_id: ServerId,
        expected_version: u64,
    ) -> ServerStoreResult<bool> {
        let expected = to_db_version(expected_version)?;
        let testing = VerificationStatus::Testing.as_str();

        self.run_blocking(move |connection| {
            let updated_count = diesel::update(
                servers::table
                    .filter(servers::id.eq(server_id.into_inner()))
                    .filter(servers::version.eq(expected))
                    .filter(servers::deleted_at.is_null())
                    .filter(servers::status.ne(testing)),
            )
            .set(servers::status.eq(testing))
            .execute(connection)
            .map_err(ServerStoreError::persistence)?;
            Ok(updated_count == 1)
        })
        .await
    }

    async fn list_by_project(&self, project_id: ProjectId) -> ServerStoreResult<Vec<Server>> {
        self.run_blocking(move |connection| {
            let rows = servers::table
                .filter(servers::project_id.eq(project_id.into_inner()))
                .filter(servers::deleted_at.is_null())
                .order_by((servers::sort_order.asc(), servers::name.asc()))
                .select(ServerRow::as_select())
                .load::<ServerRow>(connection)
                .map_err(ServerStoreError::persistence)?;
            rows.into_iter().map(row_to_server).collect()
        })
        .await
    }
}

fn to_db_version(version: u64) -> ServerStoreResult<i64> {
    i64::try_from(version).map_err(ServerStoreError::persistence)
}

fn to_new_row(server: &Server) -> ServerStoreResult<NewServerRow> {
    let connection = server.connection();

    Ok(NewServerRow {
        id: server.id().into_inner(),
        project_id: server.project_id().into_inner(),
        name: server.name().as_str().to_owned(),
        login_user: connection.user.clone(),
        ip_address: connection.ip_address.clone(),
        path: connection.path.clone(),
        port: connection.port.map(i32::from),
        deploy_code: server.deploy_code(),
        sort_order: i32::try_from(server.order()).map_err(ServerStoreError::persistence)?,
        status: server.status().as_str().to_owned(),
        output: server.output().map(str::to_owned),
        version: to_db_version(server.version())?,
        created_at: server.created_at(),
        updated_at: server.updated_at(),
        deleted_at: server.deleted_at(),
    })
}

fn row_to_server(row: ServerRow) -> ServerStoreResult<Server> {
    let ServerRow {
        id,
        project_id,
        name,
        login_user,
        ip_address,
        path,
        port,
        deploy_code,
        sort_order,
        status,
        output,
        version,
        created_at,
        updated_at,
        deleted_at,
    } = row;

    let parsed_name = ServerName::new(name).map_err(ServerStoreError::invalid_persisted_data)?;
    let parsed_status = VerificationStatus::try_from(status.as_str())
        .map_err(ServerStoreError::invalid_persisted_data)?;
    let parsed_port = port
        .map(u16::try_from)
        .transpose()
        .map_err(ServerStoreError::invalid_persisted_data)?;
    let parsed_order =
        u32::try_from(sort_order).map_err(ServerStoreError::invalid_persisted_data)?;
    let parsed_version =
        u64::try_from(version).map_err(ServerStoreError::invalid_persisted_data)?;

    let data = PersistedServerData {
        id: ServerId::from_uuid(id),
        project_id: ProjectId::from_uuid(project_id),
        name: parsed_name,
        connection: ConnectionDetails {
            user: login_user,
            ip_address,
            path,
            port: parsed_port,
        },
        deploy_code,
        order: parsed_order,
        status: parsed_status,
        output,
        version: parsed_version,
        created_at,
        updated_at,
        deleted_at,
    };

    Ok(Server::from_persisted(data))
}
