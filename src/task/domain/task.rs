//! Task entity and its change set.

use super::{TaskDomainError, TaskId, TaskStatus};
use crate::team::domain::{MemberId, TeamId, deserialize_reference};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Longest accepted title, in characters.
pub const MAX_TITLE_LENGTH: usize = 255;

/// Task stored in the raw `tasks` collection.
///
/// Assignee and team references are stored as strings. References that do
/// not parse as identities read back as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "_id")]
    id: TaskId,
    title: String,
    #[serde(default)]
    description: Option<String>,
    status: TaskStatus,
    #[serde(default, deserialize_with = "deserialize_reference")]
    assigned_to: Option<MemberId>,
    #[serde(default, deserialize_with = "deserialize_reference")]
    team_id: Option<TeamId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    title: String,
    description: Option<String>,
    status: Option<TaskStatus>,
    assigned_to: Option<MemberId>,
    team_id: Option<TeamId>,
}

impl NewTask {
    /// Creates task input with a title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: None,
            assigned_to: None,
            team_id: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an explicit status instead of the assignment-derived default.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the assignee.
    #[must_use]
    pub const fn with_assignee(mut self, member: MemberId) -> Self {
        self.assigned_to = Some(member);
        self
    }

    /// Sets the owning team.
    #[must_use]
    pub const fn with_team(mut self, team: TeamId) -> Self {
        self.team_id = Some(team);
        self
    }
}

impl Task {
    /// Creates a validated task stamped with the clock's current time.
    ///
    /// Without an explicit status, a task with an assignee starts as
    /// [`TaskStatus::Assigned`] and one without as
    /// [`TaskStatus::Unassigned`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`].
    pub fn new(input: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let title = validate_title(&input.title)?;
        let status = input.status.unwrap_or(if input.assigned_to.is_some() {
            TaskStatus::Assigned
        } else {
            TaskStatus::Unassigned
        });
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            title,
            description: input.description,
            status,
            assigned_to: input.assigned_to,
            team_id: input.team_id,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the workflow status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the assignee reference, if it is set and well formed.
    #[must_use]
    pub const fn assigned_to(&self) -> Option<MemberId> {
        self.assigned_to
    }

    /// Returns the team reference, if it is set and well formed.
    #[must_use]
    pub const fn team_id(&self) -> Option<TeamId> {
        self.team_id
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Partial update of a task. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_to: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    team_id: Option<TeamId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

impl TaskChanges {
    /// Creates an empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a new title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a new description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets a new status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets a new assignee.
    #[must_use]
    pub const fn with_assignee(mut self, member: MemberId) -> Self {
        self.assigned_to = Some(member);
        self
    }

    /// Moves the task to another team.
    #[must_use]
    pub const fn with_team(mut self, team: TeamId) -> Self {
        self.team_id = Some(team);
        self
    }

    /// Returns `true` when no field other than the timestamp would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.team_id.is_none()
    }

    /// Validates and normalizes the title when one is being set.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`].
    pub fn validated(mut self) -> Result<Self, TaskDomainError> {
        if let Some(title) = self.title.as_deref() {
            self.title = Some(validate_title(title)?);
        }
        Ok(self)
    }

    /// Stamps the change set with the clock's current time.
    #[must_use]
    pub fn stamped(mut self, clock: &impl Clock) -> Self {
        self.updated_at = Some(clock.utc());
        self
    }
}

fn validate_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    let length = trimmed.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(TaskDomainError::TitleTooLong {
            length,
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(trimmed.to_owned())
}
