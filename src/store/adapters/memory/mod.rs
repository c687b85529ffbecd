//! In-memory adapter for the document store port.

mod pipeline;
mod store;

pub use store::InMemoryDocumentStore;
