//! In-memory document store for tests and local runs.

use super::pipeline::materialize;
use crate::store::domain::{
    CollectionInfo, CollectionKind, CollectionName, Document, DocumentId, Filter, ID_FIELD,
    Update, UpdateOutcome,
};
use crate::store::ports::{DocumentStore, StoreError, StoreResult};
use crate::view::domain::ViewDefinition;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory document store.
///
/// Views are materialized when created and hold a snapshot of their rows
/// until [`DocumentStore::refresh_view`] recomputes them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    namespaces: BTreeMap<CollectionName, Namespace>,
}

#[derive(Debug)]
enum Namespace {
    Collection(Vec<Document>),
    View {
        definition: ViewDefinition,
        rows: Vec<Document>,
    },
}

impl Namespace {
    fn rows(&self) -> &[Document] {
        match self {
            Self::Collection(documents) => documents,
            Self::View { rows, .. } => rows,
        }
    }

    const fn kind(&self) -> CollectionKind {
        match self {
            Self::Collection(_) => CollectionKind::Collection,
            Self::View { .. } => CollectionKind::View,
        }
    }
}

impl StoreState {
    fn rows(&self, name: &CollectionName) -> StoreResult<&[Document]> {
        self.namespaces
            .get(name)
            .map(Namespace::rows)
            .ok_or_else(|| StoreError::NamespaceNotFound(name.clone()))
    }

    fn documents_mut(&mut self, name: &CollectionName) -> StoreResult<&mut Vec<Document>> {
        match self.namespaces.get_mut(name) {
            Some(Namespace::Collection(documents)) => Ok(documents),
            Some(Namespace::View { .. }) => Err(StoreError::ReadOnlyView(name.clone())),
            None => Err(StoreError::NamespaceNotFound(name.clone())),
        }
    }

    fn materialize(&self, definition: &ViewDefinition) -> StoreResult<Vec<Document>> {
        materialize(definition, |name| {
            self.namespaces.get(name).map(Namespace::rows)
        })
    }
}

impl InMemoryDocumentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let state = self
            .state
            .read()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))?;
        f(&state)
    }

    fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> StoreResult<T>) -> StoreResult<T> {
        let mut state = self
            .state
            .write()
            .map_err(|err| StoreError::persistence(std::io::Error::other(err.to_string())))?;
        f(&mut state)
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn create_collection(&self, name: &CollectionName) -> StoreResult<()> {
        self.write(|state| {
            if state.namespaces.contains_key(name) {
                return Err(StoreError::AlreadyExists(name.clone()));
            }
            state
                .namespaces
                .insert(name.clone(), Namespace::Collection(Vec::new()));
            Ok(())
        })
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

        self.write(|state| {
            let documents = state.documents_mut(collection)?;
            if documents
                .iter()
                .any(|existing| DocumentId::of(existing).is_ok_and(|found| found == id))
            {
                return Err(StoreError::DuplicateId {
                    collection: collection.clone(),
                    id,
                });
            }
            documents.push(document);
            Ok(id)
        })
    }

    async fn find_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        self.read(|state| {
            Ok(state
                .rows(collection)?
                .iter()
                .find(|document| filter.matches(document))
                .cloned())
        })
    }

    async fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> StoreResult<Vec<Document>> {
        self.read(|state| {
            Ok(state
                .rows(collection)?
                .iter()
                .filter(|document| filter.matches(document))
                .cloned()
                .collect())
        })
    }

    async fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> StoreResult<UpdateOutcome> {
        self.write(|state| {
            let documents = state.documents_mut(collection)?;
            let Some(document) = documents
                .iter_mut()
                .find(|document| filter.matches(document))
            else {
                return Ok(UpdateOutcome::NOT_MATCHED);
            };
            let modified = update.apply(document)?;
            Ok(if modified {
                UpdateOutcome::MODIFIED
            } else {
                UpdateOutcome::UNCHANGED
            })
        })
    }

    async fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> StoreResult<bool> {
        self.write(|state| {
            let documents = state.documents_mut(collection)?;
            let Some(position) = documents
                .iter()
                .position(|document| filter.matches(document))
            else {
                return Ok(false);
            };
            documents.remove(position);
            Ok(true)
        })
    }

    async fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        self.read(|state| {
            Ok(state
                .namespaces
                .iter()
                .map(|(name, namespace)| CollectionInfo::new(name.clone(), namespace.kind()))
                .collect())
        })
    }

    async fn drop_collection(&self, name: &CollectionName) -> StoreResult<()> {
        self.write(|state| {
            state
                .namespaces
                .remove(name)
                .map(|_| ())
                .ok_or_else(|| StoreError::NamespaceNotFound(name.clone()))
        })
    }

    async fn create_view(&self, definition: &ViewDefinition) -> StoreResult<()> {
        definition
            .validate()
            .map_err(|err| StoreError::InvalidDefinition {
                view: definition.name().clone(),
                reason: err.to_string(),
            })?;

        self.write(|state| {
            if state.namespaces.contains_key(definition.name()) {
                return Err(StoreError::AlreadyExists(definition.name().clone()));
            }
            let rows = state.materialize(definition)?;
            state.namespaces.insert(
                definition.name().clone(),
                Namespace::View {
                    definition: definition.clone(),
                    rows,
                },
            );
            Ok(())
        })
    }

    async fn refresh_view(&self, name: &CollectionName) -> StoreResult<()> {
        self.write(|state| {
            let definition = match state.namespaces.get(name) {
                Some(Namespace::View { definition, .. }) => definition.clone(),
                Some(Namespace::Collection(_)) => {
                    return Err(StoreError::InvalidDefinition {
                        view: name.clone(),
                        reason: "namespace is a collection, not a view".to_owned(),
                    });
                }
                None => return Err(StoreError::NamespaceNotFound(name.clone())),
            };
            let fresh = state.materialize(&definition)?;
            if let Some(Namespace::View { rows, .. }) = state.namespaces.get_mut(name) {
                *rows = fresh;
            }
            Ok(())
        })
    }
}
