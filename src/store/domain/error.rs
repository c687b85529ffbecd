//! Error types for document store naming and path validation.

use thiserror::Error;

/// Errors returned while constructing store-level value objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreDomainError {
    /// The collection or view name is not a plain lowercase identifier.
    #[error("invalid collection name '{0}', expected [a-z_][a-z0-9_]* of at most 63 bytes")]
    InvalidCollectionName(String),

    /// The field path contains an empty or non-identifier segment.
    #[error("invalid field path '{0}', expected dot-separated [A-Za-z0-9_] segments")]
    InvalidFieldPath(String),

    /// The document identifier is not a UUID.
    #[error("invalid document identifier '{0}'")]
    InvalidDocumentId(String),

    /// The update cannot be applied to the stored document.
    #[error("invalid update: {0}")]
    InvalidUpdate(String),
}
