//! `PostgreSQL` document store backed by JSONB tables and materialized views.

use super::models::{DocumentRow, KeyedDocumentRow, NamespaceRow};
use super::sql::{self, Statement};
use crate::store::domain::{
    CollectionInfo, CollectionKind, CollectionName, Document, DocumentId, Filter, ID_FIELD,
    Update, UpdateOutcome,
};
use crate::store::ports::{DocumentStore, StoreError, StoreResult};
use crate::view::domain::ViewDefinition;
use async_trait::async_trait;
use diesel::connection::SimpleConnection;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::{Jsonb, Text, Uuid as SqlUuid};
use serde_json::Value;
use tracing::debug;

/// `PostgreSQL` connection pool type used by the document store.
pub type StorePgPool = Pool<ConnectionManager<PgConnection>>;

const SCHEMA: &str = include_str!(
    "../../../../migrations/2026-10-01-000000_create_document_collections/up.sql"
);

/// `PostgreSQL`-backed document store.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: StorePgPool,
}

impl PostgresDocumentStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }

    /// Installs the `try_cast_uuid` helper and the raw collection tables.
    ///
    /// The script is idempotent and safe to run on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] when the script fails.
    pub async fn apply_schema(&self) -> StoreResult<()> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(SCHEMA)
                .map_err(StoreError::persistence)
        })
        .await
    }

    async fn run_blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreError::persistence)?
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    async fn create_collection(&self, name: &CollectionName) -> StoreResult<()> {
        let collection = name.clone();
        self.run_blocking(move |connection| {
            in_transaction(connection, |tx| {
                if find_namespace(tx, &collection)?.is_some() {
                    return Err(StoreError::AlreadyExists(collection.clone()));
                }
                tx.batch_execute(&sql::create_table(&collection))
                    .map_err(|err| classify_create(err, &collection))
            })
        })
        .await
    }

    async fn insert_one(
        &self,
        collection: &CollectionName,
        mut document: Document,
    ) -> StoreResult<DocumentId> {
        let id = if document.contains_key(ID_FIELD) {
            DocumentId::of(&document)?
        } else {
            let fresh = DocumentId::new();
            document.insert(ID_FIELD.to_owned(), fresh.to_value());
            fresh
        };
        let target = collection.clone();
        let statement = sql::insert(collection, &document);

        self.run_blocking(move |connection| {
            require_collection(connection, &target)?;
            bind_all(&statement)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        StoreError::DuplicateId {
                            collection: target.clone(),
                            id,
                        }
                    }
                    _ => StoreError::persistence(err),
                })?;
            Ok(id)
        })
        .await
    }

    async fn find_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        let target = collection.clone();
        let statement = sql::select(collection, filter, true);
        self.run_blocking(move |connection| {
            require_namespace(connection, &target)?;
            Ok(load_documents(connection, &statement)?.into_iter().next())
        })
        .await
    }

    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> StoreResult<Vec<Document>> {
        let target = collection.clone();
        let statement = sql::select(collection, filter, false);
        self.run_blocking(move |connection| {
            require_namespace(connection, &target)?;
            load_documents(connection, &statement)
        })
        .await
    }

    async fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome> {
        let target = collection.clone();
        let statement = sql::select_for_update(collection, filter);
        let change = update.clone();

        self.run_blocking(move |connection| {
            in_transaction(connection, |tx| {
                require_collection(tx, &target)?;
                let Some(row) = bind_all(&statement)
                    .get_result::<KeyedDocumentRow>(tx)
                    .optional()
                    .map_err(StoreError::persistence)?
                else {
                    return Ok(UpdateOutcome::NOT_MATCHED);
                };
                let mut document = into_document(row.document)?;
                if !change.apply(&mut document)? {
                    return Ok(UpdateOutcome::UNCHANGED);
                }
                diesel::sql_query(sql::replace(&target))
                    .bind::<Jsonb, _>(Value::Object(document))
                    .bind::<SqlUuid, _>(row.id)
                    .execute(tx)
                    .map_err(StoreError::persistence)?;
                Ok(UpdateOutcome::MODIFIED)
            })
        })
        .await
    }

    async fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> StoreResult<bool> {
        let target = collection.clone();
        let statement = sql::delete(collection, filter);
        self.run_blocking(move |connection| {
            require_collection(connection, &target)?;
            let removed = bind_all(&statement)
                .execute(connection)
                .map_err(StoreError::persistence)?;
            Ok(removed > 0)
        })
        .await
    }

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        self.run_blocking(|connection| {
            let rows = diesel::sql_query(sql::LIST_NAMESPACES)
                .load::<NamespaceRow>(connection)
                .map_err(StoreError::persistence)?;
            Ok(rows.into_iter().filter_map(namespace_info).collect())
        })
        .await
    }

    async fn drop_collection(&self, name: &CollectionName) -> StoreResult<()> {
        let target = name.clone();
        self.run_blocking(move |connection| {
            let row = find_namespace(connection, &target)?
                .ok_or_else(|| StoreError::NamespaceNotFound(target.clone()))?;
            debug!(namespace = %target, relkind = %row.relkind, "dropping namespace");
            connection
                .batch_execute(&sql::drop(&target, &row.relkind))
                .map_err(StoreError::persistence)
        })
        .await
    }

    async fn create_view(&self, definition: &ViewDefinition) -> StoreResult<()> {
        definition
            .validate()
            .map_err(|err| StoreError::InvalidDefinition {
                view: definition.name().clone(),
                reason: err.to_string(),
            })?;
        let view = definition.name().clone();
        let required: Vec<CollectionName> = std::iter::once(definition.source())
            .chain(definition.pipeline().joined_collections())
            .cloned()
            .collect();
        let statement = sql::create_view(definition);

        self.run_blocking(move |connection| {
            in_transaction(connection, |tx| {
                if find_namespace(tx, &view)?.is_some() {
                    return Err(StoreError::AlreadyExists(view.clone()));
                }
                for name in &required {
                    if find_namespace(tx, name)?.is_none() {
                        return Err(StoreError::InvalidDefinition {
                            view: view.clone(),
                            reason: format!("namespace {name} does not exist"),
                        });
                    }
                }
                debug!(view = %view, "creating materialized view");
                tx.batch_execute(&statement)
                    .map_err(|err| classify_create(err, &view))
            })
        })
        .await
    }

    async fn refresh_view(&self, name: &CollectionName) -> StoreResult<()> {
        let view = name.clone();
        self.run_blocking(move |connection| {
            let row = find_namespace(connection, &view)?
                .ok_or_else(|| StoreError::NamespaceNotFound(view.clone()))?;
            if row.relkind != "m" {
                return Err(StoreError::InvalidDefinition {
                    view: view.clone(),
                    reason: "namespace is not a materialized view".to_owned(),
                });
            }
            connection
                .batch_execute(&sql::refresh(&view))
                .map_err(StoreError::persistence)
        })
        .await
    }
}

#[derive(Debug)]
enum TransactionError {
    Store(StoreError),
    Diesel(DieselError),
}

impl From<DieselError> for TransactionError {
    fn from(err: DieselError) -> Self {
        Self::Diesel(err)
    }
}

fn in_transaction<T>(
    connection: &mut PgConnection,
    f: impl FnOnce(&mut PgConnection) -> StoreResult<T>,
) -> StoreResult<T> {
    connection
        .transaction::<T, TransactionError, _>(|tx| f(tx).map_err(TransactionError::Store))
        .map_err(|err| match err {
            TransactionError::Store(source) => source,
            TransactionError::Diesel(source) => StoreError::persistence(source),
        })
}

fn bind_all(statement: &Statement) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    statement.params.iter().cloned().fold(
        diesel::sql_query(statement.sql.clone()).into_boxed(),
        |query, param| query.bind::<Jsonb, _>(param),
    )
}

fn find_namespace(
    connection: &mut PgConnection,
    name: &CollectionName,
) -> StoreResult<Option<NamespaceRow>> {
    diesel::sql_query(sql::FIND_NAMESPACE)
        .bind::<Text, _>(name.as_str().to_owned())
        .get_result::<NamespaceRow>(connection)
        .optional()
        .map_err(StoreError::persistence)
}

fn require_namespace(connection: &mut PgConnection, name: &CollectionName) -> StoreResult<()> {
    find_namespace(connection, name)?
        .map(|_| ())
        .ok_or_else(|| StoreError::NamespaceNotFound(name.clone()))
}

fn require_collection(connection: &mut PgConnection, name: &CollectionName) -> StoreResult<()> {
    match find_namespace(connection, name)? {
        Some(row) if row.relkind == "r" => Ok(()),
        Some(_) => Err(StoreError::ReadOnlyView(name.clone())),
        None => Err(StoreError::NamespaceNotFound(name.clone())),
    }
}

fn load_documents(connection: &mut PgConnection, statement: &Statement) -> StoreResult<Vec<Document>> {
    bind_all(statement)
        .load::<DocumentRow>(connection)
        .map_err(StoreError::persistence)?
        .into_iter()
        .map(|row| into_document(row.document))
        .collect()
}

fn into_document(value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(document) => Ok(document),
        other => Err(StoreError::persistence(std::io::Error::other(format!(
            "stored value is not a JSON object: {other}"
        )))),
    }
}

fn namespace_info(row: NamespaceRow) -> Option<CollectionInfo> {
    let kind = if row.relkind == "r" {
        CollectionKind::Collection
    } else {
        CollectionKind::View
    };
    match CollectionName::new(row.name) {
        Ok(name) => Some(CollectionInfo::new(name, kind)),
        Err(err) => {
            debug!(error = %err, "skipping namespace with unsupported name");
            None
        }
    }
}

fn classify_create(err: DieselError, name: &CollectionName) -> StoreError {
    match &err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::AlreadyExists(name.clone())
        }
        DieselError::DatabaseError(_, info) if info.message().contains("already exists") => {
            StoreError::AlreadyExists(name.clone())
        }
        _ => StoreError::persistence(err),
    }
}
