//! Member account persistence. Members have no view and are read from the
//! raw collection only.

use crate::read_path::{RepositoryResult, codec};
use crate::store::domain::{FieldPath, Filter, ID_PATH, TEAM_MEMBERS, Update, UpdateOutcome};
use crate::store::ports::DocumentStore;
use crate::team::domain::{MemberId, Role, TeamId, TeamMember, TeamMemberChanges};
use std::sync::Arc;
use tracing::warn;

const EMAIL: FieldPath = FieldPath::from_static("email");
const ROLE: FieldPath = FieldPath::from_static("role");
const TEAMS_FIELD: FieldPath = FieldPath::from_static("teams");

/// Repository for the `team_members` collection.
#[derive(Clone)]
pub struct TeamMemberRepository<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
}

impl<S> TeamMemberRepository<S>
where
    S: DocumentStore,
{
    /// Creates a repository over the given store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persists a new member.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures.
    pub async fn create(&self, member: &TeamMember) -> RepositoryResult<MemberId> {
        let document = codec::encode(&TEAM_MEMBERS, member)?;
        self.store.insert_one(&TEAM_MEMBERS, document).await?;
        Ok(member.id())
    }

    /// Reads a member by identity.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn get(&self, id: MemberId) -> RepositoryResult<Option<TeamMember>> {
        self.find_first(&Filter::by_id(id)).await
    }

    /// Lists every member.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn get_all(&self) -> RepositoryResult<Vec<TeamMember>> {
        self.find_where(&Filter::All).await
    }

    /// Applies a partial update to a member. The change set is written as
    /// given; [`TeamMemberChanges::validated`] normalizes it beforehand.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures.
    pub async fn update(
        &self,
        id: MemberId,
        changes: &TeamMemberChanges,
    ) -> RepositoryResult<UpdateOutcome> {
        let update = Update::Set(codec::encode(&TEAM_MEMBERS, changes)?);
        let outcome = self
            .store
            .update_one(&TEAM_MEMBERS, &Filter::by_id(id), &update)
            .await?;
        if !outcome.matched {
            warn!(member_id = %id, "member update matched nothing");
        }
        Ok(outcome)
    }

    /// Deletes a member, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn delete(&self, id: MemberId) -> RepositoryResult<bool> {
        Ok(self
            .store
            .delete_one(&TEAM_MEMBERS, &Filter::by_id(id))
            .await?)
    }

    /// Finds a member by email address, compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<TeamMember>> {
        let normalized = email.trim().to_ascii_lowercase();
        self.find_first(&Filter::eq(EMAIL, normalized)).await
    }

    /// Lists members holding `role`.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_by_role(&self, role: Role) -> RepositoryResult<Vec<TeamMember>> {
        self.find_where(&Filter::eq(ROLE, role.as_str())).await
    }

    /// Lists the members with the given identities, in store order.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_many(&self, ids: &[MemberId]) -> RepositoryResult<Vec<TeamMember>> {
        let filter = Filter::any_of(ID_PATH, ids.iter().copied().map(MemberId::to_value));
        self.find_where(&filter).await
    }

    /// Records that `member` belongs to `team`.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn add_team(&self, member: MemberId, team: TeamId) -> RepositoryResult<UpdateOutcome> {
        let update = Update::AddToSet {
            field: TEAMS_FIELD,
            value: team.to_value(),
            unique_by: None,
        };
        Ok(self
            .store
            .update_one(&TEAM_MEMBERS, &Filter::by_id(member), &update)
            .await?)
    }

    /// Removes `team` from the member's back-references.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn remove_team(
        &self,
        member: MemberId,
        team: TeamId,
    ) -> RepositoryResult<UpdateOutcome> {
        let update = Update::Pull {
            field: TEAMS_FIELD,
            value: team.to_value(),
            match_on: None,
        };
        Ok(self
            .store
            .update_one(&TEAM_MEMBERS, &Filter::by_id(member), &update)
            .await?)
    }

    async fn find_first(&self, filter: &Filter) -> RepositoryResult<Option<TeamMember>> {
        self.store
            .find_one(&TEAM_MEMBERS, filter)
            .await?
            .map(|document| codec::decode(&TEAM_MEMBERS, document))
            .transpose()
    }

    async fn find_where(&self, filter: &Filter) -> RepositoryResult<Vec<TeamMember>> {
        let documents = self.store.find(&TEAM_MEMBERS, filter).await?;
        codec::decode_all(&TEAM_MEMBERS, documents)
    }
}
