//! Domain model for tasks.

mod error;
mod ids;
mod row;
mod status;
mod task;

pub use error::{ParseTaskStatusError, TaskDomainError};
pub use ids::TaskId;
pub use row::TeamTaskRow;
pub use status::TaskStatus;
pub use task::{MAX_TITLE_LENGTH, NewTask, Task, TaskChanges};
