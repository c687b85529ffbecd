//! Conversion between entities and stored documents.

use super::{RepositoryError, RepositoryResult};
use crate::store::domain::{CollectionName, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serializes an entity or change set into a document.
///
/// # Errors
///
/// Returns [`RepositoryError::Encode`] when serialization fails and
/// [`RepositoryError::NotADocument`] when the value is not a JSON object.
pub fn encode<T: Serialize>(collection: &CollectionName, value: &T) -> RepositoryResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(RepositoryError::NotADocument(collection.clone())),
        Err(source) => Err(RepositoryError::Encode {
            collection: collection.clone(),
            source,
        }),
    }
}

/// Deserializes a stored document.
///
/// # Errors
///
/// Returns [`RepositoryError::Decode`] when the document does not match `T`.
pub fn decode<T: DeserializeOwned>(
    collection: &CollectionName,
    document: Document,
) -> RepositoryResult<T> {
    serde_json::from_value(Value::Object(document)).map_err(|source| RepositoryError::Decode {
        collection: collection.clone(),
        source,
    })
}

/// Deserializes every document, failing on the first mismatch.
///
/// # Errors
///
/// Returns [`RepositoryError::Decode`] for the first document that does not
/// match `T`.
pub fn decode_all<T: DeserializeOwned>(
    collection: &CollectionName,
    documents: Vec<Document>,
) -> RepositoryResult<Vec<T>> {
    documents
        .into_iter()
        .map(|document| decode(collection, document))
        .collect()
}

/// Serializes a value embedded inside a document, such as an array element.
///
/// # Errors
///
/// Returns [`RepositoryError::Encode`] when serialization fails.
pub fn encode_value<T: Serialize>(collection: &CollectionName, value: &T) -> RepositoryResult<Value> {
    serde_json::to_value(value).map_err(|source| RepositoryError::Encode {
        collection: collection.clone(),
        source,
    })
}
