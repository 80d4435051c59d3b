// src/cascade/update.rs

//! The minimal batch of row changes a transaction hands back to its caller.

use serde::Serialize;

use crate::errors::GraphError;
use crate::graph::{Predecessor, Task, TaskGraph, TaskLock};
use crate::types::{Day, TaskId};

/// New state of one existing task whose stored row must change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    pub task_id: TaskId,
    pub new_start_date: Day,
    pub new_end_date: Day,
    pub dependencies_broken: bool,
    pub manually_positioned: bool,
    pub duration_days: u32,
    pub sequence_order: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lock: Option<TaskLock>,
    /// `Some` only when the transaction replaced the predecessor list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predecessors: Option<Vec<Predecessor>>,
}

impl TaskUpdate {
    fn from_task(task: &Task, predecessors_changed: bool) -> Self {
        Self {
            task_id: task.id.clone(),
            new_start_date: task.start_date,
            new_end_date: task.end_date(),
            dependencies_broken: task.dependencies_broken,
            manually_positioned: task.manually_positioned,
            duration_days: task.duration_days,
            sequence_order: task.sequence_order,
            lock: task.lock,
            predecessors: predecessors_changed.then(|| task.predecessors.clone()),
        }
    }
}

/// Everything a host must persist after one successful transaction, to be
/// applied as one batch.
///
/// `updates` follows the cascade's topological order, so two runs over the
/// same input produce identical sets.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UpdateSet {
    pub updates: Vec<TaskUpdate>,
    pub created: Vec<Task>,
    pub removed: Vec<TaskId>,
}

impl UpdateSet {
    /// Diff `after` against `before` over the tasks a transaction touched.
    ///
    /// `order` lists every task the cascade visited (topological order);
    /// only those whose stored state differs are reported.
    pub(crate) fn between(
        before: &TaskGraph,
        after: &TaskGraph,
        order: &[TaskId],
        removed: Vec<TaskId>,
    ) -> Self {
        let mut set = UpdateSet {
            removed,
            ..Default::default()
        };

        for id in order {
            let Some(new) = after.get(id) else {
                continue;
            };
            match before.get(id) {
                None => set.created.push(new.clone()),
                Some(old) => {
                    let predecessors_changed = old.predecessors != new.predecessors;
                    let changed = predecessors_changed
                        || old.start_date != new.start_date
                        || old.duration_days != new.duration_days
                        || old.dependencies_broken != new.dependencies_broken
                        || old.manually_positioned != new.manually_positioned
                        || old.sequence_order != new.sequence_order
                        || old.lock != new.lock;
                    if changed {
                        set.updates.push(TaskUpdate::from_task(new, predecessors_changed));
                    }
                }
            }
        }

        set
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.created.is_empty() && self.removed.is_empty()
    }

    /// Number of rows touched (updated, created or removed).
    pub fn len(&self) -> usize {
        self.updates.len() + self.created.len() + self.removed.len()
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskUpdate> {
        self.updates.iter().find(|u| u.task_id == task_id)
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.get(task_id).is_some()
    }

    /// Ids of updated tasks, in update order.
    pub fn updated_ids(&self) -> Vec<&str> {
        self.updates.iter().map(|u| u.task_id.as_str()).collect()
    }

    /// Apply this batch to a list of stored rows.
    ///
    /// Checks every update first so a missing row leaves `tasks` unchanged.
    pub fn apply_to(&self, tasks: &mut Vec<Task>) -> Result<(), GraphError> {
        for update in &self.updates {
            if !tasks.iter().any(|t| t.id == update.task_id) {
                return Err(GraphError::TaskNotFound(update.task_id.clone()));
            }
        }

        tasks.retain(|t| !self.removed.contains(&t.id));

        for update in &self.updates {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == update.task_id) {
                task.start_date = update.new_start_date;
                task.duration_days = update.duration_days;
                task.dependencies_broken = update.dependencies_broken;
                task.manually_positioned = update.manually_positioned;
                task.sequence_order = update.sequence_order;
                task.lock = update.lock;
                if let Some(preds) = &update.predecessors {
                    task.predecessors = preds.clone();
                }
            }
        }

        tasks.extend(self.created.iter().cloned());
        Ok(())
    }
}
