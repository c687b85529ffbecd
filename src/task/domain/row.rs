//! Rows of the `team_tasks_view` projection.

use super::{TaskId, TaskStatus};
use serde::Deserialize;

/// A task joined with its team name and assignee name.
///
/// Only tasks whose team and assignee both resolve appear in the view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TeamTaskRow {
    /// Task identity.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Task title.
    #[serde(default)]
    pub title: Option<String>,
    /// Task status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Name of the task's team.
    #[serde(default)]
    pub team_name: Option<String>,
    /// Name of the assigned member.
    #[serde(default)]
    pub team_member: Option<String>,
}
