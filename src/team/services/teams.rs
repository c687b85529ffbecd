//! Team orchestration: membership cap checks and member back-references.

use crate::read_path::RepositoryError;
use crate::store::ports::DocumentStore;
use crate::team::{
    domain::{
        MAX_MEMBERS, MemberId, Membership, NewTeam, Team, TeamChanges, TeamDomainError, TeamId,
    },
    repository::{FetchedTeam, FetchedTeams, TeamMemberRepository, TeamRepository},
};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Service-level errors for team operations.
#[derive(Debug, Error)]
pub enum TeamServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TeamDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// The team does not exist in the raw collection.
    #[error("team {0} not found")]
    NotFound(TeamId),
}

/// Result type for team service operations.
pub type TeamServiceResult<T> = Result<T, TeamServiceError>;

/// Team orchestration service.
///
/// Keeps each member's `teams` back-reference in step with team membership.
/// The two writes are not atomic; a failed back-reference update is
/// reported as an error after the team write has landed.
#[derive(Clone)]
pub struct TeamService<S>
where
    S: DocumentStore,
{
    teams: TeamRepository<S>,
    members: TeamMemberRepository<S>,
}

impl<S> TeamService<S>
where
    S: DocumentStore,
{
    /// Creates a team service over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            teams: TeamRepository::new(Arc::clone(&store)),
            members: TeamMemberRepository::new(store),
        }
    }

    /// Creates a team and records it on each member.
    ///
    /// # Errors
    ///
    /// Returns [`TeamServiceError::Domain`] for invalid input, including more
    /// than [`MAX_MEMBERS`] members, and repository failures.
    pub async fn create(&self, request: NewTeam) -> TeamServiceResult<Team> {
        let team = Team::new(request)?;
        self.teams.create(&team).await?;
        for entry in team.members() {
            self.link(entry.user_id, team.id()).await?;
        }
        info!(team_id = %team.id(), members = team.members().len(), "team created");
        Ok(team)
    }

    /// Reads a team through its fallback policy.
    ///
    /// # Errors
    ///
    /// Returns [`TeamServiceError::NotFound`] when neither the collection nor
    /// the view holds the team.
    pub async fn get(&self, id: TeamId) -> TeamServiceResult<FetchedTeam> {
        self.teams
            .get(id)
            .await?
            .ok_or(TeamServiceError::NotFound(id))
    }

    /// Lists teams through their fallback policy.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn list(&self) -> TeamServiceResult<FetchedTeams> {
        Ok(self.teams.get_all().await?)
    }

    /// Applies a partial update. A replaced member list is validated and the
    /// back-references of added and removed members are updated.
    ///
    /// # Errors
    ///
    /// Returns [`TeamServiceError::NotFound`] when the raw team is missing,
    /// [`TeamServiceError::Domain`] for invalid changes, and repository
    /// failures.
    pub async fn update(&self, id: TeamId, changes: TeamChanges) -> TeamServiceResult<Team> {
        let validated = changes.validated()?;
        let current = self.raw_team(id).await?;
        self.teams.update(id, &validated).await?;

        if let Some(replacement) = validated.members() {
            let before: HashSet<MemberId> = member_set(current.members());
            let after: HashSet<MemberId> = member_set(replacement);
            for removed in before.difference(&after) {
                self.unlink(*removed, id).await?;
            }
            for added in after.difference(&before) {
                self.link(*added, id).await?;
            }
        }
        self.raw_team(id).await
    }

    /// Deletes a raw team and clears it from its members' back-references.
    ///
    /// # Errors
    ///
    /// Returns [`TeamServiceError::NotFound`] when the raw team is missing
    /// and repository failures.
    pub async fn delete(&self, id: TeamId) -> TeamServiceResult<()> {
        let current = self.raw_team(id).await?;
        if !self.teams.delete(id).await? {
            return Err(TeamServiceError::NotFound(id));
        }
        for entry in current.members() {
            self.unlink(entry.user_id, id).await?;
        }
        info!(team_id = %id, "team deleted");
        Ok(())
    }

    /// Adds members to a team. Entries for members already on the team are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TeamDomainError::TooManyMembers`] when the team would exceed
    /// [`MAX_MEMBERS`], [`TeamServiceError::NotFound`] when the raw team is
    /// missing, and repository failures.
    pub async fn add_members(
        &self,
        id: TeamId,
        additions: impl IntoIterator<Item = Membership>,
    ) -> TeamServiceResult<Team> {
        let current = self.raw_team(id).await?;
        let mut seen = member_set(current.members());
        let fresh: Vec<Membership> = additions
            .into_iter()
            .filter(|entry| seen.insert(entry.user_id))
            .collect();

        let count = current.members().len() + fresh.len();
        if count > MAX_MEMBERS {
            return Err(TeamDomainError::TooManyMembers {
                count,
                max: MAX_MEMBERS,
            }
            .into());
        }

        for entry in fresh {
            self.teams.add_member(id, entry).await?;
            self.link(entry.user_id, id).await?;
        }
        self.raw_team(id).await
    }

    /// Removes a member from a team and the team from the member.
    ///
    /// # Errors
    ///
    /// Returns [`TeamServiceError::NotFound`] when the raw team is missing
    /// and repository failures.
    pub async fn remove_member(&self, id: TeamId, member: MemberId) -> TeamServiceResult<Team> {
        let outcome = self.teams.remove_member(id, member).await?;
        if !outcome.matched {
            return Err(TeamServiceError::NotFound(id));
        }
        self.unlink(member, id).await?;
        self.raw_team(id).await
    }

    /// Lists the raw teams managed by `manager`.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn teams_for_manager(&self, manager: MemberId) -> TeamServiceResult<Vec<Team>> {
        Ok(self.teams.find_by_project_manager(manager).await?)
    }

    async fn raw_team(&self, id: TeamId) -> TeamServiceResult<Team> {
        self.teams
            .get(id)
            .await?
            .and_then(FetchedTeam::into_collection)
            .ok_or(TeamServiceError::NotFound(id))
    }

    async fn link(&self, member: MemberId, team: TeamId) -> TeamServiceResult<()> {
        let outcome = self.members.add_team(member, team).await?;
        if !outcome.matched {
            warn!(member_id = %member, team_id = %team, "member missing, back-reference skipped");
        }
        Ok(())
    }

    async fn unlink(&self, member: MemberId, team: TeamId) -> TeamServiceResult<()> {
        let outcome = self.members.remove_team(member, team).await?;
        if !outcome.matched {
            warn!(member_id = %member, team_id = %team, "member missing, back-reference skipped");
        }
        Ok(())
    }
}

fn member_set(entries: &[Membership]) -> HashSet<MemberId> {
    entries.iter().map(|entry| entry.user_id).collect()
}
