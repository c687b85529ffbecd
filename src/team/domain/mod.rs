//! Domain model for teams and their members.

mod error;
mod ids;
mod member;
mod overview;
mod role;
mod team;

pub use error::{ParseRoleError, TeamDomainError};
pub use ids::{MemberId, TeamId, deserialize_reference, deserialize_references};
pub use member::{NewTeamMember, TeamMember, TeamMemberChanges};
pub use overview::{ResolvedMember, TeamOverview};
pub use role::Role;
pub use team::{MAX_MEMBERS, Membership, NewTeam, Team, TeamChanges, validate_members};
