//! Task orchestration: validation, timestamps and assignment.

use crate::read_path::RepositoryError;
use crate::store::ports::DocumentStore;
use crate::task::{
    domain::{NewTask, Task, TaskChanges, TaskDomainError, TaskId, TaskStatus, TeamTaskRow},
    repository::TaskRepository,
};
use crate::team::domain::{MemberId, TeamId};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// The task does not exist.
    #[error("task {0} not found")]
    NotFound(TaskId),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task orchestration service.
#[derive(Clone)]
pub struct TaskService<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    repository: TaskRepository<S>,
    clock: Arc<C>,
}

impl<S, C> TaskService<S, C>
where
    S: DocumentStore,
    C: Clock + Send + Sync,
{
    /// Creates a task service over the given store.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            repository: TaskRepository::new(store),
            clock,
        }
    }

    /// Creates and stores a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for an invalid title and
    /// repository failures.
    pub async fn create(&self, request: NewTask) -> TaskServiceResult<Task> {
        let task = Task::new(request, &*self.clock)?;
        self.repository.create(&task).await?;
        info!(task_id = %task.id(), status = task.status().as_str(), "task created");
        Ok(task)
    }

    /// Reads a task from the raw collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist.
    pub async fn get(&self, id: TaskId) -> TaskServiceResult<Task> {
        self.repository
            .get(id)
            .await?
            .ok_or(TaskServiceError::NotFound(id))
    }

    /// Applies a partial update and bumps `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist,
    /// [`TaskServiceError::Domain`] for an invalid title, and repository
    /// failures.
    pub async fn update(&self, id: TaskId, changes: TaskChanges) -> TaskServiceResult<Task> {
        let stamped = changes.validated()?.stamped(&*self.clock);
        let outcome = self.repository.update(id, &stamped).await?;
        if !outcome.matched {
            return Err(TaskServiceError::NotFound(id));
        }
        self.get(id).await
    }

    /// Assigns a task to a member. The status defaults to
    /// [`TaskStatus::Assigned`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist
    /// and repository failures.
    pub async fn assign(
        &self,
        id: TaskId,
        member: MemberId,
        status: Option<TaskStatus>,
    ) -> TaskServiceResult<Task> {
        let changes = TaskChanges::new()
            .with_assignee(member)
            .with_status(status.unwrap_or(TaskStatus::Assigned));
        self.update(id, changes).await
    }

    /// Deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::NotFound`] when the task does not exist
    /// and repository failures.
    pub async fn delete(&self, id: TaskId) -> TaskServiceResult<()> {
        if !self.repository.delete(id).await? {
            return Err(TaskServiceError::NotFound(id));
        }
        info!(task_id = %id, "task deleted");
        Ok(())
    }

    /// Lists the task board from `team_tasks_view`.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn list_tasks(&self) -> TaskServiceResult<Vec<TeamTaskRow>> {
        Ok(self.repository.get_all().await?)
    }

    /// Lists raw tasks assigned to `member`.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn tasks_for_member(&self, member: MemberId) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repository.find_by_assignee(member).await?)
    }

    /// Lists raw tasks belonging to any of `teams`.
    ///
    /// # Errors
    ///
    /// Returns repository failures.
    pub async fn tasks_for_teams(&self, teams: &[TeamId]) -> TaskServiceResult<Vec<Task>> {
        Ok(self.repository.find_by_team_ids(teams).await?)
    }
}
