//! Reads that choose between a raw collection and its derived view.

use super::RepositoryResult;
use crate::store::domain::{CollectionName, Document, Filter};
use crate::store::ports::{DocumentStore, StoreError};
use std::sync::Arc;
use tracing::debug;

/// Where a read is served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadPolicy {
    /// Read the raw collection; on a miss (or an empty listing), read the
    /// view.
    CollectionThenView,
    /// Read the view only.
    ViewOnly,
    /// Read the raw collection only.
    CollectionOnly,
}

/// Namespace that served a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadSource {
    /// The raw collection.
    Collection,
    /// The derived view.
    View,
}

/// A read result tagged with the namespace that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<R, V> {
    /// Value read from the raw collection.
    Collection(R),
    /// Value read from the derived view.
    View(V),
}

impl<R, V> Fetched<R, V> {
    /// Returns the namespace that served the read.
    #[must_use]
    pub const fn source(&self) -> ReadSource {
        match self {
            Self::Collection(_) => ReadSource::Collection,
            Self::View(_) => ReadSource::View,
        }
    }

    /// Returns the raw value, if the collection served the read.
    #[must_use]
    pub fn into_collection(self) -> Option<R> {
        match self {
            Self::Collection(value) => Some(value),
            Self::View(_) => None,
        }
    }

    /// Returns the view value, if the view served the read.
    #[must_use]
    pub fn into_view(self) -> Option<V> {
        match self {
            Self::Collection(_) => None,
            Self::View(value) => Some(value),
        }
    }

    /// Converts both sides, failing when either conversion fails.
    ///
    /// # Errors
    ///
    /// Returns the error of the conversion that was applied.
    pub fn try_map<R2, V2, E>(
        self,
        on_collection: impl FnOnce(R) -> Result<R2, E>,
        on_view: impl FnOnce(V) -> Result<V2, E>,
    ) -> Result<Fetched<R2, V2>, E> {
        match self {
            Self::Collection(value) => on_collection(value).map(Fetched::Collection),
            Self::View(value) => on_view(value).map(Fetched::View),
        }
    }
}

/// Reads one entity type from its raw collection and optional view.
///
/// A view that does not exist reads as empty, so repositories keep working
/// before the view manager has run.
#[derive(Clone)]
pub struct FallbackReader<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
    collection: CollectionName,
    view: Option<CollectionName>,
}

impl<S> FallbackReader<S>
where
    S: DocumentStore,
{
    /// Creates a reader over a collection and, optionally, its view.
    #[must_use]
    pub const fn new(store: Arc<S>, collection: CollectionName, view: Option<CollectionName>) -> Self {
        Self {
            store,
            collection,
            view,
        }
    }

    /// Returns the raw collection name.
    #[must_use]
    pub const fn collection(&self) -> &CollectionName {
        &self.collection
    }

    /// Returns the view name, when one is configured.
    #[must_use]
    pub const fn view(&self) -> Option<&CollectionName> {
        self.view.as_ref()
    }

    /// Returns the first document matching `filter` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns store errors other than a missing view.
    pub async fn find_one(
        &self,
        policy: ReadPolicy,
        filter: &Filter,
    ) -> RepositoryResult<Option<Fetched<Document, Document>>> {
        match policy {
            ReadPolicy::CollectionOnly => Ok(self
                .store
                .find_one(&self.collection, filter)
                .await?
                .map(Fetched::Collection)),
            ReadPolicy::ViewOnly => Ok(self.view_find_one(filter).await?.map(Fetched::View)),
            ReadPolicy::CollectionThenView => {
                if let Some(found) = self.store.find_one(&self.collection, filter).await? {
                    return Ok(Some(Fetched::Collection(found)));
                }
                debug!(collection = %self.collection, "raw miss, reading view");
                Ok(self.view_find_one(filter).await?.map(Fetched::View))
            }
        }
    }

    /// Returns every document under `policy`.
    ///
    /// With [`ReadPolicy::CollectionThenView`] the view is read only when the
    /// raw collection is empty.
    ///
    /// # Errors
    ///
    /// Returns store errors other than a missing view.
    pub async fn find_all(
        &self,
        policy: ReadPolicy,
    ) -> RepositoryResult<Fetched<Vec<Document>, Vec<Document>>> {
        self.find(policy, &Filter::All).await
    }

    /// Returns every document matching `filter` under `policy`.
    ///
    /// # Errors
    ///
    /// Returns store errors other than a missing view.
    pub async fn find(
        &self,
        policy: ReadPolicy,
        filter: &Filter,
    ) -> RepositoryResult<Fetched<Vec<Document>, Vec<Document>>> {
        match policy {
            ReadPolicy::CollectionOnly => Ok(Fetched::Collection(
                self.store.find(&self.collection, filter).await?,
            )),
            ReadPolicy::ViewOnly => Ok(Fetched::View(self.view_find(filter).await?)),
            ReadPolicy::CollectionThenView => {
                let raw = self.store.find(&self.collection, filter).await?;
                if !raw.is_empty() {
                    return Ok(Fetched::Collection(raw));
                }
                debug!(collection = %self.collection, "raw listing empty, reading view");
                Ok(Fetched::View(self.view_find(filter).await?))
            }
        }
    }

    async fn view_find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let Some(view) = &self.view else {
            return Ok(None);
        };
        match self.store.find_one(view, filter).await {
            Err(StoreError::NamespaceNotFound(_)) => {
                debug!(view = %view, "view not materialized, reading as empty");
                Ok(None)
            }
            other => other,
        }
    }

    async fn view_find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let Some(view) = &self.view else {
            return Ok(Vec::new());
        };
        match self.store.find(view, filter).await {
            Err(StoreError::NamespaceNotFound(_)) => {
                debug!(view = %view, "view not materialized, reading as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }
}
