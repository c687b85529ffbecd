//! View definitions and the catalog of views owned by the view manager.

use super::pipeline::{Expr, Pipeline, Projection, Scope, Stage};
use crate::store::domain::{CollectionName, FieldPath};
use thiserror::Error;

/// Errors found while checking the shape of a view definition.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewDefinitionError {
    /// A stage writes to a nested path; targets must be top-level fields.
    #[error("stage {stage} must target a top-level field, got '{path}'")]
    NestedTarget {
        /// Stage position, zero-based.
        stage: usize,
        /// Offending path.
        path: FieldPath,
    },

    /// A projected field name contains a dot.
    #[error("projected field '{0}' must be a single segment")]
    NestedProjection(FieldPath),

    /// The same output field is projected twice.
    #[error("field '{0}' is projected more than once")]
    DuplicateProjection(FieldPath),

    /// An element-scoped reference appears outside an `Each` expression.
    #[error("element reference '{0}' used outside an Each expression")]
    ElementOutsideEach(FieldPath),
}

/// Errors returned while assembling a view catalog.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ViewCatalogError {
    /// Two definitions share a name.
    #[error("view {0} is defined more than once")]
    DuplicateView(CollectionName),
}

/// Named view bound to a source collection and a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    name: CollectionName,
    source: CollectionName,
    pipeline: Pipeline,
}

impl ViewDefinition {
    /// Creates a view definition.
    #[must_use]
    pub const fn new(name: CollectionName, source: CollectionName, pipeline: Pipeline) -> Self {
        Self {
            name,
            source,
            pipeline,
        }
    }

    /// Returns the view name.
    #[must_use]
    pub const fn name(&self) -> &CollectionName {
        &self.name
    }

    /// Returns the source collection.
    #[must_use]
    pub const fn source(&self) -> &CollectionName {
        &self.source
    }

    /// Returns the pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Checks structural rules that the stage types cannot express: stage
    /// targets and projected names are single segments, projected names are
    /// unique per level, and element references only appear inside `Each`.
    ///
    /// Field existence is not checked here; backends report missing sources
    /// when the view is created.
    ///
    /// # Errors
    ///
    /// Returns the first [`ViewDefinitionError`] found.
    pub fn validate(&self) -> Result<(), ViewDefinitionError> {
        for (index, stage) in self.pipeline.stages().iter().enumerate() {
            match stage {
                Stage::Coerce(coerce) => require_top_level(index, &coerce.target)?,
                Stage::Lookup(lookup) => require_top_level(index, &lookup.target)?,
                Stage::Unwind(_) => {}
                Stage::Project(fields) => validate_projections(fields, false)?,
            }
        }
        Ok(())
    }
}

fn require_top_level(stage: usize, path: &FieldPath) -> Result<(), ViewDefinitionError> {
    if path.is_top_level() {
        Ok(())
    } else {
        Err(ViewDefinitionError::NestedTarget {
            stage,
            path: path.clone(),
        })
    }
}

fn validate_projections(
    fields: &[Projection],
    inside_each: bool,
) -> Result<(), ViewDefinitionError> {
    let mut seen: Vec<&FieldPath> = Vec::with_capacity(fields.len());
    for projection in fields {
        if !projection.name.is_top_level() {
            return Err(ViewDefinitionError::NestedProjection(
                projection.name.clone(),
            ));
        }
        if seen.contains(&&projection.name) {
            return Err(ViewDefinitionError::DuplicateProjection(
                projection.name.clone(),
            ));
        }
        seen.push(&projection.name);
        validate_expr(&projection.expr, inside_each)?;
    }
    Ok(())
}

fn validate_expr(expr: &Expr, inside_each: bool) -> Result<(), ViewDefinitionError> {
    let check = |scope: Scope, path: &FieldPath| {
        if scope == Scope::Element && !inside_each {
            Err(ViewDefinitionError::ElementOutsideEach(path.clone()))
        } else {
            Ok(())
        }
    };
    match expr {
        Expr::Field(field) => check(field.scope(), field.path()),
        Expr::Display(inner) => validate_expr(inner, inside_each),
        Expr::Resolve(resolve) => {
            check(resolve.within.scope(), resolve.within.path())?;
            check(resolve.reference.scope(), resolve.reference.path())
        }
        Expr::Each { input, fields } => {
            check(input.scope(), input.path())?;
            validate_projections(fields, true)
        }
    }
}

/// Immutable, ordered set of view definitions.
///
/// Built once at startup and shared with the view manager. Iteration follows
/// insertion order, which is the order views are created in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewCatalog {
    definitions: Vec<ViewDefinition>,
}

impl ViewCatalog {
    /// Creates a catalog from definitions in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`ViewCatalogError::DuplicateView`] when two definitions share
    /// a name.
    pub fn new(
        definitions: impl IntoIterator<Item = ViewDefinition>,
    ) -> Result<Self, ViewCatalogError> {
        let mut collected: Vec<ViewDefinition> = Vec::new();
        for definition in definitions {
            if collected
                .iter()
                .any(|existing| existing.name() == definition.name())
            {
                return Err(ViewCatalogError::DuplicateView(definition.name().clone()));
            }
            collected.push(definition);
        }
        Ok(Self {
            definitions: collected,
        })
    }

    /// Returns the catalog of views used by the task board:
    /// `team_tasks_view` followed by `teams_view`.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            definitions: vec![super::standard::team_tasks_view(), super::standard::teams_view()],
        }
    }

    /// Iterates over definitions in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ViewDefinition> {
        self.definitions.iter()
    }

    /// Returns the definition with the given name.
    #[must_use]
    pub fn get(&self, name: &CollectionName) -> Option<&ViewDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.name() == name)
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
