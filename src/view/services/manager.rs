//! Idempotent creation and refresh of catalog views.

use crate::store::domain::CollectionName;
use crate::store::ports::{DocumentStore, StoreError};
use crate::view::domain::{ViewCatalog, ViewDefinition};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// What happened to one view during a manager run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewOutcome {
    /// A view with this name already existed and was left untouched.
    AlreadyPresent,
    /// The view was created by this run.
    Created,
    /// Another process created the view between listing and creation.
    CreatedConcurrently,
    /// The existing view was re-materialized from current data.
    Refreshed,
}

impl ViewOutcome {
    /// Returns a stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AlreadyPresent => "already_present",
            Self::Created => "created",
            Self::CreatedConcurrently => "created_concurrently",
            Self::Refreshed => "refreshed",
        }
    }
}

/// Per-view outcomes of a manager run, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnsureReport {
    outcomes: Vec<(CollectionName, ViewOutcome)>,
}

impl EnsureReport {
    fn record(&mut self, view: &CollectionName, outcome: ViewOutcome) {
        self.outcomes.push((view.clone(), outcome));
    }

    /// Returns each view with its outcome, in catalog order.
    #[must_use]
    pub fn outcomes(&self) -> &[(CollectionName, ViewOutcome)] {
        &self.outcomes
    }

    /// Returns the outcome recorded for a view.
    #[must_use]
    pub fn outcome_of(&self, view: &CollectionName) -> Option<ViewOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == view)
            .map(|(_, outcome)| *outcome)
    }

    /// Returns the views created by this run.
    pub fn created(&self) -> impl Iterator<Item = &CollectionName> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| *outcome == ViewOutcome::Created)
            .map(|(name, _)| name)
    }

    /// Returns `true` when every view was already present.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.outcomes
            .iter()
            .all(|(_, outcome)| *outcome == ViewOutcome::AlreadyPresent)
    }
}

/// Errors returned by the view manager.
///
/// Every variant aborts the run; definitions after the failing one are not
/// processed.
#[derive(Debug, Error)]
pub enum ViewManagerError {
    /// The store catalog could not be listed.
    #[error("failed to list collections: {0}")]
    Listing(#[source] StoreError),

    /// A same-named artifact could not be dropped.
    #[error("failed to drop existing namespace {view}: {source}")]
    Drop {
        /// View being replaced.
        view: CollectionName,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The view could not be created.
    #[error("failed to create view {view}: {source}")]
    Creation {
        /// View being created.
        view: CollectionName,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },

    /// The view could not be re-materialized.
    #[error("failed to refresh view {view}: {source}")]
    Refresh {
        /// View being refreshed.
        view: CollectionName,
        /// Underlying store error.
        #[source]
        source: StoreError,
    },
}

/// Result type for view manager operations.
pub type ViewManagerResult<T> = Result<T, ViewManagerError>;

/// Keeps the views of a [`ViewCatalog`] in place in a document store.
#[derive(Clone)]
pub struct ViewManager<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
    catalog: Arc<ViewCatalog>,
}

impl<S> ViewManager<S>
where
    S: DocumentStore,
{
    /// Creates a manager for the given store and catalog.
    #[must_use]
    pub const fn new(store: Arc<S>, catalog: Arc<ViewCatalog>) -> Self {
        Self { store, catalog }
    }

    /// Returns the catalog managed by this instance.
    #[must_use]
    pub fn catalog(&self) -> &ViewCatalog {
        &self.catalog
    }

    /// Creates every catalog view that is not already present as a view.
    ///
    /// Presence is checked by name and kind only; an existing view is never
    /// compared against its definition. A same-named collection is dropped
    /// and replaced. Creation races with another process are reported as
    /// [`ViewOutcome::CreatedConcurrently`].
    ///
    /// # Errors
    ///
    /// Returns the first listing, drop or creation failure; remaining
    /// definitions are skipped.
    pub async fn ensure_views(&self) -> ViewManagerResult<EnsureReport> {
        let mut report = EnsureReport::default();
        for definition in self.catalog.iter() {
            let outcome = self.ensure_view(definition).await?;
            report.record(definition.name(), outcome);
        }
        info!(
            views = report.outcomes().len(),
            created = report.created().count(),
            "view catalog ensured"
        );
        Ok(report)
    }

    async fn ensure_view(&self, definition: &ViewDefinition) -> ViewManagerResult<ViewOutcome> {
        let view = definition.name();
        let existing = self
            .store
            .list_collections()
            .await
            .map_err(ViewManagerError::Listing)?;

        if existing
            .iter()
            .any(|info| info.name() == view && info.is_view())
        {
            debug!(view = %view, "view already present");
            return Ok(ViewOutcome::AlreadyPresent);
        }

        match self.store.drop_collection(view).await {
            Ok(()) => warn!(view = %view, "dropped non-view namespace occupying view name"),
            Err(StoreError::NamespaceNotFound(_)) => {
                debug!(view = %view, "no existing namespace to drop");
            }
            Err(source) => {
                error!(view = %view, error = %source, "failed to drop namespace");
                return Err(ViewManagerError::Drop {
                    view: view.clone(),
                    source,
                });
            }
        }

        self.create(definition).await
    }

    async fn create(&self, definition: &ViewDefinition) -> ViewManagerResult<ViewOutcome> {
        let view = definition.name();
        match self.store.create_view(definition).await {
            Ok(()) => {
                info!(
                    view = %view,
                    source = %definition.source(),
                    stages = definition.pipeline().len(),
                    "view created"
                );
                Ok(ViewOutcome::Created)
            }
            Err(StoreError::AlreadyExists(_)) => {
                info!(view = %view, "view created concurrently");
                Ok(ViewOutcome::CreatedConcurrently)
            }
            Err(source) => {
                error!(view = %view, error = %source, "view creation failed, aborting");
                Err(ViewManagerError::Creation {
                    view: view.clone(),
                    source,
                })
            }
        }
    }

    /// Re-materializes every catalog view from current source data.
    ///
    /// Present views are refreshed; missing views are created.
    ///
    /// # Errors
    ///
    /// Returns the first listing, refresh or creation failure.
    pub async fn refresh_views(&self) -> ViewManagerResult<EnsureReport> {
        let existing = self
            .store
            .list_collections()
            .await
            .map_err(ViewManagerError::Listing)?;
        let mut report = EnsureReport::default();

        for definition in self.catalog.iter() {
            let view = definition.name();
            let present = existing
                .iter()
                .any(|info| info.name() == view && info.is_view());
            let outcome = if present {
                self.store
                    .refresh_view(view)
                    .await
                    .map_err(|source| ViewManagerError::Refresh {
                        view: view.clone(),
                        source,
                    })?;
                debug!(view = %view, "view refreshed");
                ViewOutcome::Refreshed
            } else {
                self.ensure_view(definition).await?
            };
            report.record(view, outcome);
        }
        info!(views = report.outcomes().len(), "view catalog refreshed");
        Ok(report)
    }
}
