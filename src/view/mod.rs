//! Materialized read-models over the raw collections.
//!
//! Views are declared as typed pipelines in [`domain`] and kept in place by
//! the [`services::ViewManager`], which runs once at startup and again on an
//! explicit refresh. Views are never written directly and do not follow
//! writes to their sources until re-materialized.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
