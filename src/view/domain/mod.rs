//! View definitions expressed as typed pipelines.
//!
//! A [`ViewDefinition`] binds a view name to a source collection and a
//! [`Pipeline`]. The [`ViewCatalog`] holds the definitions the view manager
//! keeps in place.

mod definition;
mod pipeline;
mod standard;

pub use definition::{ViewCatalog, ViewCatalogError, ViewDefinition, ViewDefinitionError};
pub use pipeline::{
    Coerce, Expr, FieldRef, LocalKey, Lookup, Pipeline, Projection, Resolve, Scope, Stage, Unwind,
};
pub use standard::{team_tasks_view, teams_view};
