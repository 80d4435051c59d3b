// src/graph/task.rs

//! The schedulable unit and its predecessor relations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::{Day, DependencyType, TaskId};

/// Why the cascade must leave a task where it is.
///
/// Variants are ordered strongest first, so the smallest lock a task holds
/// is the one reported. `ManuallyPositioned` mirrors the pin flag and is
/// never stored in [`Task::lock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLock {
    /// The supplier confirmed the booked dates.
    SupplierConfirm,
    /// The dates were confirmed internally.
    Confirm,
    /// Work has started.
    Started,
    /// Work is complete.
    Completed,
    /// Placed by hand.
    ManuallyPositioned,
}

impl TaskLock {
    pub fn code(self) -> &'static str {
        match self {
            TaskLock::SupplierConfirm => "supplier_confirm",
            TaskLock::Confirm => "confirm",
            TaskLock::Started => "started",
            TaskLock::Completed => "completed",
            TaskLock::ManuallyPositioned => "manually_positioned",
        }
    }

    /// Started and completed work can not be unlocked again.
    pub fn is_clearable(self) -> bool {
        !matches!(self, TaskLock::Started | TaskLock::Completed)
    }

    /// Whether this value may be stored in [`Task::lock`].
    pub fn is_stored(self) -> bool {
        self != TaskLock::ManuallyPositioned
    }
}

impl fmt::Display for TaskLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for TaskLock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "supplier_confirm" => Ok(TaskLock::SupplierConfirm),
            "confirm" => Ok(TaskLock::Confirm),
            "started" => Ok(TaskLock::Started),
            "completed" => Ok(TaskLock::Completed),
            "manually_positioned" => Ok(TaskLock::ManuallyPositioned),
            other => Err(format!(
                "invalid lock: {other} (expected supplier_confirm, confirm, started or completed)"
            )),
        }
    }
}

/// One predecessor relation of a task.
///
/// Field names on the wire follow the `{id, type, lag}` shape hosts already
/// store; the type is a closed enum, so unknown relation types are rejected
/// when the row is read rather than wherever it happens to be used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predecessor {
    #[serde(rename = "id")]
    pub predecessor_id: TaskId,

    #[serde(rename = "type", default)]
    pub dependency_type: DependencyType,

    /// Signed day offset applied to the constraint; negative permits overlap.
    #[serde(rename = "lag", default)]
    pub lag_days: i64,
}

impl Predecessor {
    pub fn new(predecessor_id: impl Into<TaskId>, dependency_type: DependencyType, lag_days: i64) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            dependency_type,
            lag_days,
        }
    }

    /// Finish-to-start relation with the given lag.
    pub fn finish_to_start(predecessor_id: impl Into<TaskId>, lag_days: i64) -> Self {
        Self::new(predecessor_id, DependencyType::FinishToStart, lag_days)
    }

    /// Start-to-start relation with the given lag.
    pub fn start_to_start(predecessor_id: impl Into<TaskId>, lag_days: i64) -> Self {
        Self::new(predecessor_id, DependencyType::StartToStart, lag_days)
    }
}

/// A task row as read from (and written back to) the schedule store.
///
/// `end_date` is derived from `start_date + duration_days` and never stored,
/// so the two can not drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    /// Non-negative; 0 marks a milestone.
    pub duration_days: u32,

    pub start_date: Day,

    /// Ordered predecessor relations.
    #[serde(default)]
    pub predecessors: Vec<Predecessor>,

    /// When set, cascade never moves this task (it still propagates from it).
    #[serde(default)]
    pub manually_positioned: bool,

    /// Set by the engine only: a pinned task now violates a predecessor
    /// constraint.
    #[serde(default)]
    pub dependencies_broken: bool,

    /// Display / iteration tie-break; not a scheduling constraint.
    #[serde(default)]
    pub sequence_order: i64,

    /// Confirmation or progress lock. Like a pin, it keeps the cascade from
    /// moving the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<TaskLock>,
}

/// Snapshot rows are plain tasks; the alias names the host-facing role.
pub type TaskSnapshot = Task;

impl Task {
    pub fn new(id: impl Into<TaskId>, duration_days: u32, start_date: Day) -> Self {
        Self {
            id: id.into(),
            duration_days,
            start_date,
            predecessors: Vec::new(),
            manually_positioned: false,
            dependencies_broken: false,
            sequence_order: 0,
            lock: None,
        }
    }

    pub fn end_date(&self) -> Day {
        self.start_date + Day::from(self.duration_days)
    }

    /// True when the cascade must not move this task.
    pub fn is_locked(&self) -> bool {
        self.manually_positioned || self.lock.is_some()
    }

    /// The strongest lock held, counting the pin flag as the weakest.
    pub fn strongest_lock(&self) -> Option<TaskLock> {
        [
            self.lock,
            self.manually_positioned.then_some(TaskLock::ManuallyPositioned),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Ordering key used wherever iteration order must be deterministic.
    pub fn order_key(&self) -> (i64, &str) {
        (self.sequence_order, self.id.as_str())
    }

    /// Human-readable predecessor list, e.g. `excavationFS+3, slabSS`.
    pub fn predecessor_display(&self) -> String {
        if self.predecessors.is_empty() {
            return "None".to_string();
        }
        self.predecessors
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
