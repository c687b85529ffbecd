//! `PostgreSQL` adapter for the document store port.

mod models;
mod sql;
mod store;

pub use store::{PostgresDocumentStore, StorePgPool};
