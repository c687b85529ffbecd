//! Errors raised by entity repositories.

use crate::store::domain::CollectionName;
use crate::store::ports::StoreError;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors returned by entity repositories.
///
/// Store failures pass through unchanged; the repository layer only adds
/// failures to convert between entities and documents.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An entity could not be converted to a document.
    #[error("failed to encode document for {collection}: {source}")]
    Encode {
        /// Target collection.
        collection: CollectionName,
        /// Serialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// A stored document could not be converted to an entity.
    #[error("failed to decode document from {collection}: {source}")]
    Decode {
        /// Source collection or view.
        collection: CollectionName,
        /// Deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// An entity serialized to something other than a JSON object.
    #[error("value for {0} does not serialize to a JSON object")]
    NotADocument(CollectionName),
}
