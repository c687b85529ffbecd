//! Port for the document database: collection CRUD plus view catalog
//! management.

use crate::store::domain::{
    CollectionInfo, CollectionName, Document, DocumentId, Filter, StoreDomainError, Update,
    UpdateOutcome,
};
use crate::view::domain::ViewDefinition;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for document store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Document database contract.
///
/// Reads and writes address a namespace by name. Views are listed alongside
/// collections, reject writes, and hold the rows produced when they were last
/// materialized.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when any namespace with the name
    /// exists.
    async fn create_collection(&self, name: &CollectionName) -> StoreResult<()>;

    /// Inserts a document, assigning a fresh identity when `_id` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the collection does not
    /// exist, [`StoreError::DuplicateId`] when the identity is taken, and
    /// [`StoreError::ReadOnlyView`] when the namespace is a view.
    async fn insert_one(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> StoreResult<DocumentId>;

    /// Returns the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the namespace does not
    /// exist.
    async fn find_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> StoreResult<Option<Document>>;

    /// Returns every document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the namespace does not
    /// exist.
    async fn find(&self, collection: &CollectionName, filter: &Filter)
    -> StoreResult<Vec<Document>>;

    /// Applies `update` to the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the collection does not
    /// exist and [`StoreError::ReadOnlyView`] when it is a view.
    async fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome>;

    /// Deletes the first document matching `filter`, returning whether one
    /// was removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the collection does not
    /// exist and [`StoreError::ReadOnlyView`] when it is a view.
    async fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> StoreResult<bool>;

    /// Lists collections and views, ordered by name.
    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>>;

    /// Drops a collection or view.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when nothing with the name
    /// exists.
    async fn drop_collection(&self, name: &CollectionName) -> StoreResult<()>;

    /// Creates and materializes a view from its definition.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] when the name is taken,
    /// [`StoreError::InvalidDefinition`] when the pipeline cannot be built,
    /// and backend errors for pipelines the database rejects.
    async fn create_view(&self, definition: &ViewDefinition) -> StoreResult<()>;

    /// Recomputes the rows of an existing view from current source data.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NamespaceNotFound`] when the view does not
    /// exist.
    async fn refresh_view(&self, name: &CollectionName) -> StoreResult<()>;
}

/// Errors returned by document store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No collection or view with this name exists.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(CollectionName),

    /// A collection or view with this name already exists.
    #[error("namespace already exists: {0}")]
    AlreadyExists(CollectionName),

    /// A document with the same identity is already stored.
    #[error("duplicate document {id} in {collection}")]
    DuplicateId {
        /// Target collection.
        collection: CollectionName,
        /// Conflicting identity.
        id: DocumentId,
    },

    /// The namespace is a view and cannot be written.
    #[error("namespace {0} is a read-only view")]
    ReadOnlyView(CollectionName),

    /// The document could not be stored as given.
    #[error("invalid document: {0}")]
    InvalidDocument(#[from] StoreDomainError),

    /// The view definition cannot be turned into a pipeline.
    #[error("invalid definition for view {view}: {reason}")]
    InvalidDefinition {
        /// View being created.
        view: CollectionName,
        /// Human-readable reason.
        reason: String,
    },

    /// Backend failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a backend error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns `true` for [`StoreError::NamespaceNotFound`].
    #[must_use]
    pub const fn is_namespace_not_found(&self) -> bool {
        matches!(self, Self::NamespaceNotFound(_))
    }
}
