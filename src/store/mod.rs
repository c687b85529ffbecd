//! Document persistence for the task board.
//!
//! Raw entities live in named collections of JSON documents; derived
//! read-models live in views built from pipelines over those collections.
//! The module follows hexagonal architecture:
//!
//! - Naming, document, filter and update types in [`domain`]
//! - The [`ports::DocumentStore`] contract in [`ports`]
//! - In-memory and `PostgreSQL` implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;
