//! Team member accounts.

use super::{MemberId, Role, TeamDomainError, TeamId, deserialize_references};
use serde::{Deserialize, Serialize};

/// Member account stored in the raw `team_members` collection.
///
/// `teams` is a denormalized back-reference kept in step with team
/// membership by the team service. Malformed entries are skipped on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(rename = "_id")]
    id: MemberId,
    name: String,
    email: String,
    role: Role,
    hashed_password: String,
    #[serde(default, deserialize_with = "deserialize_references")]
    teams: Vec<TeamId>,
}

/// Input for creating a team member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTeamMember {
    /// Display name.
    pub name: String,
    /// Contact and login address.
    pub email: String,
    /// Account-wide role.
    pub role: Role,
    /// Credential hash produced outside this crate.
    pub hashed_password: String,
}

impl NewTeamMember {
    /// Creates member input.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        hashed_password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role,
            hashed_password: hashed_password.into(),
        }
    }
}

impl TeamMember {
    /// Creates a validated member with a fresh identity and no teams.
    ///
    /// # Errors
    ///
    /// Returns [`TeamDomainError::EmptyMemberName`] or
    /// [`TeamDomainError::InvalidEmail`].
    pub fn new(input: NewTeamMember) -> Result<Self, TeamDomainError> {
        Ok(Self {
            id: MemberId::new(),
            name: validate_member_name(&input.name)?,
            email: validate_email(&input.email)?,
            role: input.role,
            hashed_password: input.hashed_password,
            teams: Vec::new(),
        })
    }

    /// Returns the member identifier.
    #[must_use]
    pub const fn id(&self) -> MemberId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the account-wide role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Returns the credential hash.
    #[must_use]
    pub fn hashed_password(&self) -> &str {
        &self.hashed_password
    }

    /// Returns the teams this member belongs to.
    #[must_use]
    pub fn teams(&self) -> &[TeamId] {
        &self.teams
    }
}

/// Partial update of a member account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeamMemberChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hashed_password: Option<String>,
}

impl TeamMemberChanges {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets a new email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets a new role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Sets a new credential hash.
    #[must_use]
    pub fn with_hashed_password(mut self, hashed_password: impl Into<String>) -> Self {
        self.hashed_password = Some(hashed_password.into());
        self
    }

    /// Returns the replacement email address, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns `true` when nothing would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.hashed_password.is_none()
    }

    /// Validates and normalizes the fields being set.
    ///
    /// # Errors
    ///
    /// Returns the first [`TeamDomainError`] found.
    pub fn validated(mut self) -> Result<Self, TeamDomainError> {
        if let Some(name) = self.name.as_deref() {
            self.name = Some(validate_member_name(name)?);
        }
        if let Some(email) = self.email.as_deref() {
            self.email = Some(validate_email(email)?);
        }
        Ok(self)
    }
}

fn validate_member_name(name: &str) -> Result<String, TeamDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TeamDomainError::EmptyMemberName);
    }
    Ok(trimmed.to_owned())
}

fn validate_email(email: &str) -> Result<String, TeamDomainError> {
    let trimmed = email.trim();
    let well_formed = trimmed.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    });
    if !well_formed {
        return Err(TeamDomainError::InvalidEmail(email.to_owned()));
    }
    Ok(trimmed.to_ascii_lowercase())
}
