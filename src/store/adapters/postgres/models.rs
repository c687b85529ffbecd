//! Row types returned by raw document store queries.

use diesel::prelude::*;
use diesel::sql_types::{Jsonb, Text, Uuid as SqlUuid};
use serde_json::Value;

/// A stored or materialized document.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct DocumentRow {
    #[diesel(sql_type = Jsonb)]
    pub(super) document: Value,
}

/// A collection row with its key, used for read-modify-write updates.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct KeyedDocumentRow {
    #[diesel(sql_type = SqlUuid)]
    pub(super) id: uuid::Uuid,
    #[diesel(sql_type = Jsonb)]
    pub(super) document: Value,
}

/// Catalog entry from `pg_class`.
#[derive(Debug, Clone, QueryableByName)]
pub(super) struct NamespaceRow {
    #[diesel(sql_type = Text)]
    pub(super) name: String,
    #[diesel(sql_type = Text)]
    pub(super) relkind: String,
}
