//! Team aggregate and its embedded membership list.

use super::{MemberId, Role, TeamDomainError, TeamId, deserialize_reference};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Largest number of members a team may hold.
pub const MAX_MEMBERS: usize = 5;

/// Embedded membership entry: a member reference and the member's role in
/// this team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    /// Referenced team member.
    pub user_id: MemberId,
    /// Role annotation within the team.
    pub role: Role,
}

impl Membership {
    /// Creates a membership entry.
    #[must_use]
    pub const fn new(user_id: MemberId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Team stored in the raw `teams` collection.
///
/// Membership entries whose `user_id` is not a UUID or whose role is unknown
/// are skipped on read; the remaining entries keep their stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(rename = "_id")]
    id: TeamId,
    name: String,
    #[serde(default, deserialize_with = "deserialize_memberships")]
    members: Vec<Membership>,
    #[serde(default, deserialize_with = "deserialize_reference")]
    project_manager: Option<MemberId>,
}

/// Input for creating a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeam {
    /// Team name.
    pub name: String,
    /// Initial members in display order.
    pub members: Vec<Membership>,
    /// Managing member, if any.
    pub project_manager: Option<MemberId>,
}

impl NewTeam {
    /// Creates team input with a name and no members.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            project_manager: None,
        }
    }

    /// Adds a member.
    #[must_use]
    pub fn with_member(mut self, user_id: MemberId, role: Role) -> Self {
        self.members.push(Membership::new(user_id, role));
        self
    }

    /// Sets the project manager.
    #[must_use]
    pub const fn with_project_manager(mut self, manager: MemberId) -> Self {
        self.project_manager = Some(manager);
        self
    }
}

impl Team {
    /// Creates a validated team with a fresh identity.
    ///
    /// # Errors
    ///
    /// Returns [`TeamDomainError::EmptyTeamName`] for a blank name and the
    /// membership errors of [`validate_members`].
    pub fn new(input: NewTeam) -> Result<Self, TeamDomainError> {
        let name = validate_name(&input.name)?;
        validate_members(&input.members)?;
        Ok(Self {
            id: TeamId::new(),
            name,
            members: input.members,
            project_manager: input.project_manager,
        })
    }

    /// Returns the team identifier.
    #[must_use]
    pub const fn id(&self) -> TeamId {
        self.id
    }

    /// Returns the team name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the members in stored order.
    #[must_use]
    pub fn members(&self) -> &[Membership] {
        &self.members
    }

    /// Returns the project manager reference, if any.
    #[must_use]
    pub const fn project_manager(&self) -> Option<MemberId> {
        self.project_manager
    }

    /// Returns `true` when the member is part of the team.
    #[must_use]
    pub fn has_member(&self, member: MemberId) -> bool {
        self.members.iter().any(|entry| entry.user_id == member)
    }
}

/// Partial update of a team. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<Vec<Membership>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_manager: Option<MemberId>,
}

impl TeamChanges {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renames the team.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replaces the member list.
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = Membership>) -> Self {
        self.members = Some(members.into_iter().collect());
        self
    }

    /// Replaces the project manager.
    #[must_use]
    pub const fn with_project_manager(mut self, manager: MemberId) -> Self {
        self.project_manager = Some(manager);
        self
    }

    /// Returns the replacement member list, if any.
    #[must_use]
    pub fn members(&self) -> Option<&[Membership]> {
        self.members.as_deref()
    }

    /// Returns `true` when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.members.is_none() && self.project_manager.is_none()
    }

    /// Checks the same rules as [`Team::new`] for the fields being set and
    /// normalizes the name.
    ///
    /// # Errors
    ///
    /// Returns the first [`TeamDomainError`] found.
    pub fn validated(mut self) -> Result<Self, TeamDomainError> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(validate_name(name)?);
        }
        if let Some(members) = self.members.as_deref() {
            validate_members(members)?;
        }
        Ok(self)
    }
}

fn deserialize_memberships<'de, D>(deserializer: D) -> Result<Vec<Membership>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = raw else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn validate_name(name: &str) -> Result<String, TeamDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TeamDomainError::EmptyTeamName);
    }
    Ok(trimmed.to_owned())
}

/// Checks the member cap and rejects duplicate member references.
///
/// # Errors
///
/// Returns [`TeamDomainError::TooManyMembers`] above [`MAX_MEMBERS`] and
/// [`TeamDomainError::DuplicateMember`] when a member appears twice.
pub fn validate_members(members: &[Membership]) -> Result<(), TeamDomainError> {
    if members.len() > MAX_MEMBERS {
        return Err(TeamDomainError::TooManyMembers {
            count: members.len(),
            max: MAX_MEMBERS,
        });
    }
    for (index, entry) in members.iter().enumerate() {
        if members
            .iter()
            .take(index)
            .any(|earlier| earlier.user_id == entry.user_id)
        {
            return Err(TeamDomainError::DuplicateMember(entry.user_id));
        }
    }
    Ok(())
}
