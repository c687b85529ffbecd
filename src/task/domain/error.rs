//! Error types for task validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or changing tasks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the length limit.
    #[error("task title has {length} characters, at most {max} are allowed")]
    TitleTooLong {
        /// Title length in characters.
        length: usize,
        /// Length limit.
        max: usize,
    },
}

/// Error returned while parsing task statuses from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);
