//! Repositories for teams and member accounts.

mod member;
mod team;

pub use member::TeamMemberRepository;
pub use team::{FetchedTeam, FetchedTeams, TeamRepository};
