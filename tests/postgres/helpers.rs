//! Shared helpers for the live `PostgreSQL` store tests.

pub use super::cluster::{BoxError, PostgresCluster, postgres_cluster};
use super::cluster::TemporaryDatabase;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use rstest::fixture;
use std::sync::Arc;
use taskboard::bootstrap::{RAW_COLLECTIONS, ensure_collections};
use taskboard::store::adapters::postgres::PostgresDocumentStore;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Schema script installing `try_cast_uuid` and the raw collection tables.
pub const CREATE_SCHEMA_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_document_collections/up.sql");

/// Template database holding the migrated schema.
pub const TEMPLATE_DB: &str = "taskboard_test_template";

/// Builds the runtime that owns the in-process cluster.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| Box::new(err) as BoxError)
}

/// Ensures the template database exists with the schema applied.
pub async fn ensure_template(cluster: PostgresCluster) -> Result<(), BoxError> {
    let connection = cluster.connection();
    cluster
        .ensure_template_exists(TEMPLATE_DB, move |db_name| {
            apply_schema(&connection.database_url(db_name))
        })
        .await
}

fn apply_schema(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(|err| Box::new(err) as BoxError)?;
    conn.batch_execute(CREATE_SCHEMA_SQL)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(())
}

/// Opens a document store on `url` with up to `size` pooled connections.
pub fn open_store(url: &str, size: u32) -> Result<Arc<PostgresDocumentStore>, BoxError> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder()
        .max_size(size)
        .build(manager)
        .map_err(|err| Box::new(err) as BoxError)?;
    Ok(Arc::new(PostgresDocumentStore::new(pool)))
}

/// A migrated scratch database with its raw collections and a store.
pub struct PreparedStore {
    /// Store over the scratch database.
    pub store: Arc<PostgresDocumentStore>,
    /// Scratch database, dropped with the context.
    pub temp_db: TemporaryDatabase,
}

/// Provides a scratch database copied from the template, with the raw
/// collections registered and no views.
#[fixture]
pub async fn prepared_store(
    postgres_cluster: Result<PostgresCluster, BoxError>,
) -> Result<PreparedStore, BoxError> {
    let cluster = postgres_cluster?;
    ensure_template(cluster).await?;
    let name = format!("views_{}", Uuid::new_v4().simple());
    let temp_db = cluster
        .temporary_database_from_template(&name, TEMPLATE_DB)
        .await?;
    let store = open_store(temp_db.url(), 4)?;
    ensure_collections(store.as_ref(), &RAW_COLLECTIONS).await?;
    Ok(PreparedStore { store, temp_db })
}
