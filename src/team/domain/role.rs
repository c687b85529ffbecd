//! Roles held by team members.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};

/// Role of a team member, either account-wide or as a per-team annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Works on assigned tasks.
    Developer,
    /// Coordinates a team's developers.
    TeamLead,
    /// Owns teams and their task backlog.
    ProjectManager,
    /// Administers every team.
    SuperAdmin,
}

impl Role {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Developer => "developer",
            Self::TeamLead => "team_lead",
            Self::ProjectManager => "project_manager",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "developer" => Ok(Self::Developer),
            "team_lead" => Ok(Self::TeamLead),
            "project_manager" => Ok(Self::ProjectManager),
            "super_admin" => Ok(Self::SuperAdmin),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}
