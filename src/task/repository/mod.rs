//! Task persistence over the document store.
//!
//! Single tasks are read from the raw `tasks` collection only. The board
//! listing comes from `team_tasks_view` only, with no fallback; the raw
//! listing is a separate operation.

use crate::read_path::{FallbackReader, Fetched, ReadPolicy, RepositoryResult, codec};
use crate::store::domain::{
    FieldPath, Filter, TASKS, TEAM_TASKS_VIEW, Update, UpdateOutcome,
};
use crate::store::ports::DocumentStore;
use crate::task::domain::{Task, TaskChanges, TaskId, TeamTaskRow};
use crate::team::domain::{MemberId, TeamId};
use std::sync::Arc;
use tracing::{debug, warn};

const ASSIGNED_TO: FieldPath = FieldPath::from_static("assigned_to");
const TEAM_ID: FieldPath = FieldPath::from_static("team_id");

/// Repository for the `tasks` collection and `team_tasks_view`.
#[derive(Clone)]
pub struct TaskRepository<S>
where
    S: DocumentStore,
{
    store: Arc<S>,
    reader: FallbackReader<S>,
}

impl<S> TaskRepository<S>
where
    S: DocumentStore,
{
    /// Creates a repository over the given store.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        let reader = FallbackReader::new(Arc::clone(&store), TASKS, Some(TEAM_TASKS_VIEW));
        Self { store, reader }
    }

    /// Persists a new task.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures, including a duplicate identity.
    pub async fn create(&self, task: &Task) -> RepositoryResult<TaskId> {
        let document = codec::encode(&TASKS, task)?;
        self.store.insert_one(&TASKS, document).await?;
        debug!(task_id = %task.id(), "task created");
        Ok(task.id())
    }

    /// Reads a task from the raw collection.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn get(&self, id: TaskId) -> RepositoryResult<Option<Task>> {
        self.reader
            .find_one(ReadPolicy::CollectionOnly, &Filter::by_id(id))
            .await?
            .and_then(Fetched::into_collection)
            .map(|document| codec::decode(&TASKS, document))
            .transpose()
    }

    /// Applies a partial update to a task.
    ///
    /// # Errors
    ///
    /// Returns encode or store failures.
    pub async fn update(&self, id: TaskId, changes: &TaskChanges) -> RepositoryResult<UpdateOutcome> {
        let update = Update::Set(codec::encode(&TASKS, changes)?);
        let outcome = self
            .store
            .update_one(&TASKS, &Filter::by_id(id), &update)
            .await?;
        if !outcome.matched {
            warn!(task_id = %id, "task update matched nothing");
        }
        Ok(outcome)
    }

    /// Deletes a task, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns store failures.
    pub async fn delete(&self, id: TaskId) -> RepositoryResult<bool> {
        Ok(self.store.delete_one(&TASKS, &Filter::by_id(id)).await?)
    }

    /// Lists the board rows of `team_tasks_view`.
    ///
    /// The view reflects the raw collection as of its last refresh; a view
    /// that has not been created reads as empty.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn get_all(&self) -> RepositoryResult<Vec<TeamTaskRow>> {
        let rows = self
            .reader
            .find_all(ReadPolicy::ViewOnly)
            .await?
            .into_view()
            .unwrap_or_default();
        codec::decode_all(&TEAM_TASKS_VIEW, rows)
    }

    /// Lists every raw task.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn get_all_raw(&self) -> RepositoryResult<Vec<Task>> {
        self.find_raw(&Filter::All).await
    }

    /// Lists raw tasks assigned to `member`.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_by_assignee(&self, member: MemberId) -> RepositoryResult<Vec<Task>> {
        self.find_raw(&Filter::eq(ASSIGNED_TO, member.to_value()))
            .await
    }

    /// Lists raw tasks belonging to any of `teams`.
    ///
    /// # Errors
    ///
    /// Returns store or decode failures.
    pub async fn find_by_team_ids(&self, teams: &[TeamId]) -> RepositoryResult<Vec<Task>> {
        let filter = Filter::any_of(TEAM_ID, teams.iter().copied().map(TeamId::to_value));
        self.find_raw(&filter).await
    }

    async fn find_raw(&self, filter: &Filter) -> RepositoryResult<Vec<Task>> {
        let documents = self
            .reader
            .find(ReadPolicy::CollectionOnly, filter)
            .await?
            .into_collection()
            .unwrap_or_default();
        codec::decode_all(&TASKS, documents)
    }
}
