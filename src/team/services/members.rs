//! Member account management with validation and email uniqueness.

use crate::read_path::RepositoryError;
use crate::store::ports::DocumentStore;
use crate::team::{
    domain::{MemberId, NewTeamMember, Role, TeamDomainError, TeamMember, TeamMemberChanges},
    repository::{TeamMemberRepository, TeamRepository},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for member operations.
#[derive(Debug, Error)]
pub enum MemberServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TeamDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// The member does not exist.
    #[error("team member {0} not found")]
    NotFound(MemberId),
    /// Another member already uses the address.
    #[error("email '{0}' is already in use")]
    EmailTaken(String),
}

/// Result type for member service operations.
pub type MemberServiceResult<T> = Result<T, MemberServiceError>;

/// Member account service.
///
/// Every write passes through domain validation, so stored emails are
/// always trimmed and lowercased and [`find_by_email`](Self::find_by_email)
/// matches them.
#[derive(Clone)]
pub struct MemberService<S>
where
    S: DocumentStore,
{
    members: TeamMemberRepository<S>,
    teams: TeamRepository<S>,
}

impl<S> MemberService<S>
where
    S: DocumentStore,
{
    /// Creates a member service over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            members: TeamMemberRepository::new(Arc::clone(&store)),
            teams: TeamRepository::new(store),
        }
    }

    /// Creates a member account.
    ///
    /// # Errors
    ///
    /// Returns [`MemberServiceError::Domain`] for invalid input,
    /// [`MemberServiceError::EmailTaken`] when the normalized address is in
    /// use, and repository failures.
    pub async fn create(&self, request: NewTeamMember) -> MemberServiceResult<TeamMember> {
        let member = TeamMember::new(request)?;
        self.ensure_email_free(member.email(), None).await?;
        self.members.create(&member).await?;
        info!(member_id = %member.id(), role = member.role().as_str(), "team member created");
        Ok(member)
    }

    /// Reads a member.
    ///
    /// # Errors
    ///
    /// Returns [`MemberServiceError::NotFound`] for an unknown member and
    /// repository failures.
    pub async fn get(&self, id: MemberId) -> MemberServiceResult<TeamMember> {
        self.members
            .get(id)
            .await?
            .ok_or(MemberServiceError::NotFound(id))
    }

    /// Lists every member.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn list(&self) -> MemberServiceResult<Vec<TeamMember>> {
        Ok(self.members.get_all().await?)
    }

    /// Applies a validated partial update and returns the stored member.
    ///
    /// # Errors
    ///
    /// Returns [`MemberServiceError::Domain`] for invalid changes,
    /// [`MemberServiceError::EmailTaken`] when the new address belongs to
    /// another member, [`MemberServiceError::NotFound`] for an unknown
    /// member, and repository failures.
    pub async fn update(
        &self,
        id: MemberId,
        changes: TeamMemberChanges,
    ) -> MemberServiceResult<TeamMember> {
        let validated = changes.validated()?;
        if let Some(email) = validated.email() {
            self.ensure_email_free(email, Some(id)).await?;
        }
        if !validated.is_empty() {
            let outcome = self.members.update(id, &validated).await?;
            if !outcome.matched {
                return Err(MemberServiceError::NotFound(id));
            }
        }
        self.get(id).await
    }

    /// Deletes a member and removes it from every team that lists it.
    ///
    /// # Errors
    ///
    /// Returns [`MemberServiceError::NotFound`] for an unknown member and
    /// repository failures.
    pub async fn delete(&self, id: MemberId) -> MemberServiceResult<()> {
        let member = self.get(id).await?;
        if !self.members.delete(id).await? {
            return Err(MemberServiceError::NotFound(id));
        }
        for team in member.teams() {
            let outcome = self.teams.remove_member(*team, id).await?;
            if !outcome.matched {
                warn!(member_id = %id, team_id = %team, "back-referenced team is missing");
            }
        }
        info!(member_id = %id, "team member deleted");
        Ok(())
    }

    /// Finds a member by email address, compared after normalization.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn find_by_email(&self, email: &str) -> MemberServiceResult<Option<TeamMember>> {
        Ok(self.members.find_by_email(email).await?)
    }

    /// Lists members holding `role`.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn find_by_role(&self, role: Role) -> MemberServiceResult<Vec<TeamMember>> {
        Ok(self.members.find_by_role(role).await?)
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        owner: Option<MemberId>,
    ) -> MemberServiceResult<()> {
        match self.members.find_by_email(email).await? {
            Some(existing) if Some(existing.id()) != owner => {
                Err(MemberServiceError::EmailTaken(email.to_owned()))
            }
            _ => Ok(()),
        }
    }
}
