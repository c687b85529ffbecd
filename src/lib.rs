//! Taskboard: role-based team task management over a document store.
//!
//! Raw entities (tasks, teams, team members) live in collections. Two
//! derived views join them for reading: `team_tasks_view` and `teams_view`.
//! Views are materialized at startup and on explicit refresh, never on
//! write.
//!
//! # Architecture
//!
//! Taskboard follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, memory)
//!
//! # Modules
//!
//! - [`store`]: Document store port with in-memory and `PostgreSQL` adapters
//! - [`view`]: View definitions and the view manager
//! - [`read_path`]: Collection-or-view reads used by repositories
//! - [`task`] and [`team`]: Entities, repositories and services
//! - [`bootstrap`]: Startup routine creating collections and views
//! - [`config`]: Database selection from the environment
//! - [`seed`]: Demo data for local development

pub mod bootstrap;
pub mod config;
pub mod read_path;
pub mod seed;
pub mod store;
pub mod task;
pub mod team;
pub mod view;
