//! Port contracts for document persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by repositories and
//! the view manager.

pub mod document_store;

pub use document_store::{DocumentStore, StoreError, StoreResult};
