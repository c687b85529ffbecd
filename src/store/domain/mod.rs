//! Domain model for the document store.
//!
//! Collections hold JSON documents keyed by a UUID identity. Views are named,
//! read-only namespaces whose rows are produced from a pipeline over other
//! collections.

mod document;
mod error;
mod names;

pub use document::{
    CollectionInfo, CollectionKind, Document, DocumentId, Filter, ID_FIELD, ID_PATH, Update,
    UpdateOutcome, document_value_at, value_at,
};
pub use error::StoreDomainError;
pub use names::{CollectionName, FieldPath};

/// Raw collection holding tasks.
pub const TASKS: CollectionName = CollectionName::from_static("tasks");

/// Raw collection holding teams.
pub const TEAMS: CollectionName = CollectionName::from_static("teams");

/// Raw collection holding team members.
pub const TEAM_MEMBERS: CollectionName = CollectionName::from_static("team_members");

/// Derived view joining tasks with their team and assignee.
pub const TEAM_TASKS_VIEW: CollectionName = CollectionName::from_static("team_tasks_view");

/// Derived view resolving team members and the project manager.
pub const TEAMS_VIEW: CollectionName = CollectionName::from_static("teams_view");
