//! Teams and member accounts.
//!
//! Teams embed an ordered member list of `{user_id, role}` entries and are
//! read through the raw `teams` collection with a fallback to `teams_view`.
//! Members live in `team_members` and carry a back-reference list of their
//! teams, which [`services::TeamService`] keeps in step. Account writes go
//! through [`services::MemberService`], which normalizes emails and keeps
//! them unique.

pub mod domain;
pub mod repository;
pub mod services;

#[cfg(test)]
mod tests;
