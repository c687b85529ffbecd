//! Error types for team and team member validation.

use super::MemberId;
use thiserror::Error;

/// Errors returned while constructing or changing teams and members.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TeamDomainError {
    /// The team name is empty after trimming.
    #[error("team name must not be empty")]
    EmptyTeamName,

    /// The team would exceed its member cap.
    #[error("team has {count} members, at most {max} are allowed")]
    TooManyMembers {
        /// Requested member count.
        count: usize,
        /// Member cap.
        max: usize,
    },

    /// The same member is listed twice.
    #[error("member {0} is listed more than once")]
    DuplicateMember(MemberId),

    /// The member name is empty after trimming.
    #[error("member name must not be empty")]
    EmptyMemberName,

    /// The email address is not of the form `local@domain`.
    #[error("invalid email address '{0}'")]
    InvalidEmail(String),
}

/// Error returned while parsing roles from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
