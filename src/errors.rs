// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

use crate::graph::TaskLock;
use crate::types::{Day, DependencyType, TaskId};

/// Structural problems found while loading a schedule snapshot into a
/// [`TaskGraph`](crate::graph::TaskGraph).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("malformed graph: task '{0}' appears more than once")]
    DuplicateTask(TaskId),

    #[error("malformed graph: task '{task}' references unknown predecessor '{predecessor}'")]
    UnknownPredecessor { task: TaskId, predecessor: TaskId },

    #[error("malformed graph: task '{0}' lists itself as a predecessor")]
    SelfReference(TaskId),

    #[error(
        "malformed graph: task '{task}' lists predecessor '{predecessor}' ({dependency_type}) more than once"
    )]
    DuplicatePredecessor {
        task: TaskId,
        predecessor: TaskId,
        dependency_type: DependencyType,
    },

    #[error("malformed graph: cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<TaskId> },

    #[error("malformed graph: task '{task}' has out-of-range start day {start}")]
    DateOutOfRange { task: TaskId, start: Day },

    #[error("malformed graph: task '{task}' has out-of-range duration {duration}")]
    DurationOutOfRange { task: TaskId, duration: u32 },

    #[error("malformed graph: task '{task}' has out-of-range lag {lag} on predecessor '{predecessor}'")]
    LagOutOfRange {
        task: TaskId,
        predecessor: TaskId,
        lag: i64,
    },

    #[error("malformed graph: task '{task}' stores lock '{lock}', which is set through the pin flag")]
    InvalidLock { task: TaskId, lock: TaskLock },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
}

/// Rejection of a proposed predecessor edge.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("task '{task}' cannot be its own predecessor")]
    SelfReference { task: TaskId },

    #[error("edge would create a cycle: {}", .path.join(" -> "))]
    CycleDetected { path: Vec<TaskId> },

    #[error("task not found: {0}")]
    UnknownTask(TaskId),
}

/// Rejection of a [`TaskEdit`](crate::edit::TaskEdit). Every variant leaves
/// the schedule untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("edit would create a cycle: {}", .path.join(" -> "))]
    WouldCreateCycle { path: Vec<TaskId> },

    #[error("unknown predecessor: {id}")]
    UnknownPredecessor { id: TaskId },

    #[error("task '{task}' cannot be its own predecessor")]
    SelfReference { task: TaskId },

    #[error("invalid duration for task '{task}': {duration}")]
    InvalidDuration { task: TaskId, duration: i64 },

    #[error("invalid start day for task '{task}': {start}")]
    InvalidDate { task: TaskId, start: Day },

    #[error("invalid lag for task '{task}' on predecessor '{predecessor}': {lag}")]
    InvalidLag {
        task: TaskId,
        predecessor: TaskId,
        lag: i64,
    },

    #[error("task '{task}' lists predecessor '{predecessor}' ({dependency_type}) more than once")]
    DuplicatePredecessor {
        task: TaskId,
        predecessor: TaskId,
        dependency_type: DependencyType,
    },

    #[error("unknown task: {id}")]
    UnknownTask { id: TaskId },

    #[error("task already exists: {id}")]
    DuplicateTask { id: TaskId },

    #[error(
        "task '{task}' is still a predecessor of {}; detach it first",
        .successors.join(", ")
    )]
    TaskHasSuccessors {
        task: TaskId,
        successors: Vec<TaskId>,
    },

    #[error("lock '{lock}' cannot be stored on task '{task}'; pin the task instead")]
    InvalidLock { task: TaskId, lock: TaskLock },

    #[error("task '{task}' is {lock}; that lock cannot be cleared")]
    LockNotClearable { task: TaskId, lock: TaskLock },

    #[error("schedule snapshot is malformed: {0}")]
    MalformedSnapshot(#[from] GraphError),
}

impl From<CycleError> for EditError {
    fn from(err: CycleError) -> Self {
        match err {
            CycleError::SelfReference { task } => EditError::SelfReference { task },
            CycleError::CycleDetected { path } => EditError::WouldCreateCycle { path },
            CycleError::UnknownTask(id) => EditError::UnknownPredecessor { id },
        }
    }
}

#[derive(Error, Debug)]
pub enum CascadeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CascadeError>;
