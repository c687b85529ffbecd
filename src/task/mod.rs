//! Tasks and the team task board.
//!
//! Tasks are written to the raw `tasks` collection. Single reads use that
//! collection; the board listing is served by `team_tasks_view`, which only
//! changes when the views are refreshed.

pub mod domain;
pub mod repository;
pub mod services;

#[cfg(test)]
mod tests;
