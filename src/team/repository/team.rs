//! Team persistence over the document store.

use crate::read_path::{FallbackReader, Fetched, ReadPolicy, RepositoryResult, codec};
use crate::store::domain::{FieldPath, Filter, TEAMS, TEAMS_VIEW, Update, UpdateOutcome};
use crate::store::ports::DocumentStore;
use crate::team::domain::{MemberId, Membership, Team, TeamChanges, TeamId, TeamOverview};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const MEMBERS: FieldPath = FieldPath::from_static("members");
const MEMBER_USER_ID: FieldPath = FieldPath::from_static("user_id");
const PROJECT_MANAGER: FieldPath = FieldPath::from_static("project_manager");

/// A team read through its fallback policy: the raw entity, or the resolved
/// `teams_view` row when the raw collection missed.
pub type FetchedTeam = Fetched<Team, TeamOverview>;

/// Team listing read through its fallback policy.
pub type FetchedTeams = Fetched<Vec<Team>, Vec<TeamOverview>>;

/// Repository for the `teams` collection.
///
/// Single reads and listings prefer the raw collection and fall back to
/// `teams_view`. Writes go to `teams` only.
#[derive(Clone)]
pub struct TeamRepository<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
    reader: FallbackReader<S>,
}

impl<S> TeamRepository<S>
where
    S: DocumentStore,
{
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let reader = FallbackReader::new(Arc::clone(&store), TEAMS, Some(TEAMS_VIEW));
        Self { store, reader }
    }

    /// Persists a new team.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures, including a duplicate identity.
    pub async fn create(&self, team: &Team) -> RepositoryResult<TeamId> {
        let document = codec::encode(&TEAMS, team)?;
        self.store.insert_one(&TEAMS, document).await?;
        debug!(team_id = %team.id(), "team created");
        Ok(team.id())
    }

    /// Reads a team, falling back to `teams_view` on a raw miss.
    ///
    /// # Errors
    ///
    /// Returns store failures and decode failures for either source.
    pub async fn get(&self, id: TeamId) -> RepositoryResult<Option<FetchedTeam>> {
        let found = self
            .reader
            .find_one(ReadPolicy::CollectionThenView, &Filter::by_id(id))
            .await?;
        found
            .map(|fetched| {
                fetched.try_map(
                    |document| codec::decode(&TEAMS, document),
                    |document| codec::decode(&TEAMS_VIEW, document),
                )
            })
            .transpose()
    }

    /// Lists teams, reading `teams_view` when the raw collection is empty.
    ///
    /// # Errors
    ///
    /// Returns store failures and decode failures for either source.
    pub async fn get_all(&self) -> RepositoryResult<FetchedTeams> {
        self.reader
            .find_all(ReadPolicy::CollectionThenView)
            .await?
            .try_map(
                |documents| codec::decode_all(&TEAMS, documents),
                |documents| codec::decode_all(&TEAMS_VIEW, documents),
            )
    }

    /// Applies a partial update to a team.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures.
    pub async fn update(&self, id: TeamId, changes: &TeamChanges) -> RepositoryResult<UpdateOutcome> {
        let update = Update::Set(codec::encode(&TEAMS, changes)?);
        let outcome = self
            .store
            .update_one(&TEAMS, &Filter::by_id(id), &update)
            .await?;
        if !outcome.matched {
            warn!(team_id = %id, "team update matched nothing");
        }
        Ok(outcome)
    }

    /// Deletes a team, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn delete(&self, id: TeamId) -> RepositoryResult<bool> {
        Ok(self.store.delete_one(&TEAMS, &Filter::by_id(id)).await?)
    }

    /// Appends a membership unless the member is already on the team.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures.
    pub async fn add_member(
        &self,
        id: TeamId,
        membership: Membership,
    ) -> RepositoryResult<UpdateOutcome> {
        let update = Update::AddToSet {
            field: MEMBERS,
            value: codec::encode_value(&TEAMS, &membership)?,
            unique_by: Some(MEMBER_USER_ID),
        };
        Ok(self
            .store
            .update_one(&TEAMS, &Filter::by_id(id), &update)
            .await?)
    }

    /// Removes every membership entry for `member`.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn remove_member(
        &self,
        id: TeamId,
        member: MemberId,
    ) -> RepositoryResult<UpdateOutcome> {
        let update = Update::Pull {
            field: MEMBERS,
            value: member.to_value(),
            match_on: Some(MEMBER_USER_ID),
        };
        Ok(self
            .store
            .update_one(&TEAMS, &Filter::by_id(id), &update)
            .await?)
    }

    /// Returns the distinct member ids across all raw teams, in first-seen
    /// order.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn member_ids(&self) -> RepositoryResult<Vec<MemberId>> {
        let documents = self.store.find(&TEAMS, &Filter::All).await?;
        let teams: Vec<Team> = codec::decode_all(&TEAMS, documents)?;
        let mut seen = HashSet::new();
        Ok(teams
            .iter()
            .flat_map(Team::members)
            .map(|entry| entry.user_id)
            .filter(|member| seen.insert(*member))
            .collect())
    }

    /// Lists the raw teams managed by `manager`.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_by_project_manager(&self, manager: MemberId) -> RepositoryResult<Vec<Team>> {
        let filter = Filter::eq(PROJECT_MANAGER, manager.to_value());
        let documents = self.store.find(&TEAMS, &filter).await?;
        codec::decode_all(&TEAMS, documents)
    }
}
