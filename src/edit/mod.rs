// src/edit/mod.rs

//! Edit boundary of the engine.
//!
//! Callers describe one logical change as a [`TaskEdit`]; the pure
//! [`transaction::EditTransaction`] validates it against a snapshot, runs the
//! cascade exactly once and returns the minimal update set.
//!
//! Only [`TaskEdit::SetPredecessors`] (and [`TaskEdit::AddTask`] for a new
//! row) carries predecessors, and always as the complete list. No other edit
//! can reach a task's predecessor set.

use crate::graph::{Predecessor, Task, TaskLock};
use crate::types::{Day, TaskId};

pub mod coalesce;
pub mod instantiate;
pub mod transaction;

pub use coalesce::EditCoalescer;
pub use instantiate::{Instantiation, instantiate};
pub use transaction::{CommittedEdit, EditTransaction};

/// One caller-initiated change to a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEdit {
    /// New duration; negative values are rejected at the boundary.
    ChangeDuration { task_id: TaskId, duration_days: i64 },
    /// Direct reposition (e.g. a drag). Pins the task at `start_date`.
    ChangeStartDate { task_id: TaskId, start_date: Day },
    /// Full replacement of the predecessor list. An empty list removes all
    /// predecessors.
    SetPredecessors {
        task_id: TaskId,
        predecessors: Vec<Predecessor>,
    },
    /// Pin or unpin. Unpinning lets the cascade move the task again.
    MarkManuallyPositioned {
        task_id: TaskId,
        manually_positioned: bool,
    },
    /// Set or clear a confirmation / progress lock. `started` and
    /// `completed` can only be replaced by one another.
    SetLock {
        task_id: TaskId,
        lock: Option<TaskLock>,
    },
    /// Remove a task that no other task lists as a predecessor.
    Delete { task_id: TaskId },
    /// Add a new task row.
    AddTask { task: Task },
}

/// Discriminant of a [`TaskEdit`], used for coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Duration,
    StartDate,
    Predecessors,
    ManualPosition,
    Lock,
    Delete,
    Add,
}

impl EditKind {
    /// Whether a later edit of this kind fully supersedes an earlier one for
    /// the same task.
    pub fn supersedes_earlier(self) -> bool {
        !matches!(self, EditKind::Delete | EditKind::Add)
    }
}

impl TaskEdit {
    pub fn task_id(&self) -> &str {
        match self {
            TaskEdit::ChangeDuration { task_id, .. }
            | TaskEdit::ChangeStartDate { task_id, .. }
            | TaskEdit::SetPredecessors { task_id, .. }
            | TaskEdit::MarkManuallyPositioned { task_id, .. }
            | TaskEdit::SetLock { task_id, .. }
            | TaskEdit::Delete { task_id } => task_id,
            TaskEdit::AddTask { task } => &task.id,
        }
    }

    pub fn kind(&self) -> EditKind {
        match self {
            TaskEdit::ChangeDuration { .. } => EditKind::Duration,
            TaskEdit::ChangeStartDate { .. } => EditKind::StartDate,
            TaskEdit::SetPredecessors { .. } => EditKind::Predecessors,
            TaskEdit::MarkManuallyPositioned { .. } => EditKind::ManualPosition,
            TaskEdit::SetLock { .. } => EditKind::Lock,
            TaskEdit::Delete { .. } => EditKind::Delete,
            TaskEdit::AddTask { .. } => EditKind::Add,
        }
    }
}
