//! Read-path plumbing shared by entity repositories.
//!
//! Each entity type reads through a [`FallbackReader`] with an explicit
//! [`ReadPolicy`]: teams prefer the raw collection and fall back to
//! `teams_view`, task listings come from `team_tasks_view` only, and single
//! tasks and team members come from their raw collections. Results are
//! tagged with the namespace that served them.
//!
//! Writes never go through this module; repositories send them to raw
//! collections directly.

pub mod codec;
mod error;
mod reader;

pub use error::{RepositoryError, RepositoryResult};
pub use reader::{FallbackReader, Fetched, ReadPolicy, ReadSource};

#[cfg(test)]
mod tests;
