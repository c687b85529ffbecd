//! Startup routine: raw collections first, then the catalog views.

use crate::store::domain::{CollectionName, TASKS, TEAM_MEMBERS, TEAMS};
use crate::store::ports::{DocumentStore, StoreError};
use crate::view::domain::ViewCatalog;
use crate::view::services::{EnsureReport, ViewManager, ViewManagerError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Raw collections the application writes to.
pub const RAW_COLLECTIONS: [CollectionName; 3] = [TASKS, TEAMS, TEAM_MEMBERS];

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A raw collection could not be created.
    #[error("failed to create collection {collection}: {source}")]
    Collection {
        /// Collection being created.
        collection: CollectionName,
        /// Store failure.
        #[source]
        source: StoreError,
    },
    /// The catalog views could not be put in place.
    #[error(transparent)]
    Views(#[from] ViewManagerError),
}

/// Creates each collection in `names` that does not exist yet.
///
/// Returns the collections that were created. A collection created by
/// another process in the meantime counts as present.
///
/// # Errors
///
/// Returns [`BootstrapError::Collection`] for any other store failure.
pub async fn ensure_collections<S>(
    store: &S,
    names: &[CollectionName],
) -> Result<Vec<CollectionName>, BootstrapError>
where
    S: DocumentStore,
{
    let mut created = Vec::new();
    for name in names {
        match store.create_collection(name).await {
            Ok(()) => {
                info!(collection = %name, "collection created");
                created.push(name.clone());
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!(collection = %name, "collection already present");
            }
            Err(source) => {
                return Err(BootstrapError::Collection {
                    collection: name.clone(),
                    source,
                });
            }
        }
    }
    Ok(created)
}

/// Ensures the raw collections and then the catalog views.
///
/// # Errors
///
/// Returns the first collection or view failure; startup should not proceed.
pub async fn bootstrap<S>(
    store: Arc<S>,
    catalog: Arc<ViewCatalog>,
) -> Result<EnsureReport, BootstrapError>
where
    S: DocumentStore,
{
    ensure_collections(store.as_ref(), &RAW_COLLECTIONS).await?;
    let report = ViewManager::new(store, catalog).ensure_views().await?;
    info!(
        created = report.created().count(),
        noop = report.is_noop(),
        "bootstrap complete"
    );
    Ok(report)
}
