//! Rows of the `teams_view` projection.

use super::Role;
use serde::Deserialize;

/// A team as materialized in `teams_view`, with member references resolved.
///
/// Identities are display strings. Fields the view could not resolve are
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamOverview {
    /// Team identity as a display string.
    #[serde(rename = "_id")]
    pub id: String,
    /// Team name.
    #[serde(default)]
    pub name: Option<String>,
    /// Resolved project manager identity.
    #[serde(default)]
    pub project_manager: Option<String>,
    /// Resolved project manager name.
    #[serde(default)]
    pub project_manager_name: Option<String>,
    /// Members in the team's stored order.
    #[serde(default)]
    pub members: Vec<ResolvedMember>,
}

/// One embedded member entry joined with its member account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResolvedMember {
    /// Member identity as a display string.
    #[serde(default)]
    pub id: Option<String>,
    /// Role annotation from the team.
    #[serde(default)]
    pub role: Option<Role>,
    /// Member name, when the reference resolved.
    #[serde(default)]
    pub name: Option<String>,
    /// Member email, when the reference resolved.
    #[serde(default)]
    pub email: Option<String>,
}
