// src/edit/transaction.rs

//! Pure edit transaction.
//!
//! A transaction takes a read-only snapshot graph plus one or more edits and
//! either returns the complete recomputed graph together with its
//! [`UpdateSet`], or a rejection. It owns no channels, locks or storage;
//! serialization per schedule is the job of
//! [`ScheduleService`](crate::service::ScheduleService).
//!
//! All edits are staged on a private copy. The cascade then runs exactly once
//! over the union of dirty tasks, so a batch of N edits costs one pass, not N.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::cascade::{CascadeEngine, CascadeOptions, UpdateSet};
use crate::edit::TaskEdit;
use crate::errors::{EditError, GraphError};
use crate::graph::{CycleValidator, Predecessor, Task, TaskGraph, TaskLock};
use crate::types::{Day, MAX_ABS_DAY, MAX_ABS_LAG_DAYS, MAX_DURATION_DAYS, TaskId};

/// Outcome of a successful transaction.
#[derive(Debug, Clone)]
pub struct CommittedEdit {
    /// The schedule after the edit and cascade.
    pub graph: TaskGraph,
    /// Rows the caller must persist.
    pub updates: UpdateSet,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EditTransaction {
    engine: CascadeEngine,
}

/// Staging state shared by all edits of one batch.
#[derive(Debug, Default)]
struct Staged {
    dirty: Vec<TaskId>,
    removed: Vec<TaskId>,
}

impl EditTransaction {
    pub fn new(options: CascadeOptions) -> Self {
        Self {
            engine: CascadeEngine::new(options),
        }
    }

    pub fn engine(&self) -> &CascadeEngine {
        &self.engine
    }

    /// Apply a single edit.
    pub fn apply(&self, snapshot: &TaskGraph, edit: TaskEdit) -> Result<CommittedEdit, EditError> {
        self.apply_batch(snapshot, vec![edit])
    }

    /// Apply several edits as one all-or-nothing unit with a single cascade.
    ///
    /// Each edit is validated against the state left by the previous ones.
    pub fn apply_batch(&self, snapshot: &TaskGraph, edits: Vec<TaskEdit>) -> Result<CommittedEdit, EditError> {
        let edit_count = edits.len();
        let mut working = snapshot.clone();
        let mut staged = Staged::default();

        for edit in edits {
            debug!(task = %edit.task_id(), kind = ?edit.kind(), "staging edit");
            stage(&mut working, snapshot, edit, &mut staged)?;
        }

        let mut seen = HashSet::new();
        let dirty: Vec<TaskId> = staged
            .dirty
            .into_iter()
            .filter(|id| working.contains(id) && seen.insert(id.clone()))
            .collect();

        let order = self
            .engine
            .recompute(&mut working, &dirty)
            .map_err(cascade_rejection)?;
        let updates = UpdateSet::between(snapshot, &working, &order, staged.removed);

        info!(
            edits = edit_count,
            updated = updates.updates.len(),
            created = updates.created.len(),
            removed = updates.removed.len(),
            "edit transaction committed"
        );

        Ok(CommittedEdit {
            graph: working,
            updates,
        })
    }

    /// Forward pass over every task, repairing any drift in the snapshot.
    pub fn recalculate_all(&self, snapshot: &TaskGraph) -> Result<CommittedEdit, EditError> {
        let mut working = snapshot.clone();
        let seeds: Vec<TaskId> = working.tasks().into_iter().map(|t| t.id.clone()).collect();
        let order = self
            .engine
            .recompute(&mut working, &seeds)
            .map_err(cascade_rejection)?;
        let updates = UpdateSet::between(snapshot, &working, &order, Vec::new());

        info!(updated = updates.updates.len(), "full recalculation finished");

        Ok(CommittedEdit {
            graph: working,
            updates,
        })
    }
}

fn stage(working: &mut TaskGraph, snapshot: &TaskGraph, edit: TaskEdit, staged: &mut Staged) -> Result<(), EditError> {
    match edit {
        TaskEdit::ChangeDuration {
            task_id,
            duration_days,
        } => {
            let duration = checked_duration(&task_id, duration_days)?;
            let task = existing(working, &task_id)?;
            task.duration_days = duration;
            staged.dirty.push(task_id);
        }
        TaskEdit::ChangeStartDate { task_id, start_date } => {
            checked_start(&task_id, start_date)?;
            let task = existing(working, &task_id)?;
            task.start_date = start_date;
            task.manually_positioned = true;
            staged.dirty.push(task_id);
        }
        TaskEdit::SetPredecessors {
            task_id,
            predecessors,
        } => {
            existing(working, &task_id)?;
            validate_predecessors(working, &task_id, &predecessors, true)?;
            working.replace_predecessors(&task_id, predecessors);
            staged.dirty.push(task_id);
        }
        TaskEdit::MarkManuallyPositioned {
            task_id,
            manually_positioned,
        } => {
            let task = existing(working, &task_id)?;
            task.manually_positioned = manually_positioned;
            staged.dirty.push(task_id);
        }
        TaskEdit::SetLock { task_id, lock } => {
            if let Some(lock) = lock {
                checked_lock(&task_id, lock)?;
            }
            let task = existing(working, &task_id)?;
            if let Some(current) = task.lock.filter(|held| !held.is_clearable()) {
                if !lock.is_some_and(|next| !next.is_clearable()) {
                    return Err(EditError::LockNotClearable {
                        task: task_id,
                        lock: current,
                    });
                }
            }
            task.lock = lock;
            staged.dirty.push(task_id);
        }
        TaskEdit::Delete { task_id } => {
            existing(working, &task_id)?;
            let successors: Vec<TaskId> = working
                .successors(&task_id)
                .into_iter()
                .map(|t| t.id.clone())
                .collect();
            if !successors.is_empty() {
                return Err(EditError::TaskHasSuccessors {
                    task: task_id,
                    successors,
                });
            }
            working.remove(&task_id);
            staged.dirty.retain(|id| *id != task_id);
            if snapshot.contains(&task_id) {
                staged.removed.push(task_id);
            }
        }
        TaskEdit::AddTask { mut task } => {
            if working.contains(&task.id) {
                return Err(EditError::DuplicateTask { id: task.id });
            }
            if task.duration_days > MAX_DURATION_DAYS {
                return Err(EditError::InvalidDuration {
                    task: task.id,
                    duration: i64::from(task.duration_days),
                });
            }
            checked_start(&task.id, task.start_date)?;
            if let Some(lock) = task.lock {
                checked_lock(&task.id, lock)?;
            }
            validate_predecessors(working, &task.id, &task.predecessors, false)?;

            task.dependencies_broken = false;
            let id = task.id.clone();
            working.insert(task);
            staged.removed.retain(|r| *r != id);
            staged.dirty.push(id);
        }
    }
    Ok(())
}

/// A start the cascade could not place is the edit's fault, not the
/// snapshot's.
fn cascade_rejection(err: GraphError) -> EditError {
    match err {
        GraphError::DateOutOfRange { task, start } => EditError::InvalidDate { task, start },
        other => EditError::MalformedSnapshot(other),
    }
}

fn existing<'a>(working: &'a mut TaskGraph, task_id: &str) -> Result<&'a mut Task, EditError> {
    working.task_mut(task_id).ok_or_else(|| EditError::UnknownTask {
        id: task_id.to_string(),
    })
}

fn checked_duration(task_id: &str, duration: i64) -> Result<u32, EditError> {
    u32::try_from(duration)
        .ok()
        .filter(|d| *d <= MAX_DURATION_DAYS)
        .ok_or_else(|| EditError::InvalidDuration {
            task: task_id.to_string(),
            duration,
        })
}

fn checked_start(task_id: &str, start: Day) -> Result<(), EditError> {
    if start.abs() > MAX_ABS_DAY {
        return Err(EditError::InvalidDate {
            task: task_id.to_string(),
            start,
        });
    }
    Ok(())
}

fn checked_lock(task_id: &str, lock: TaskLock) -> Result<(), EditError> {
    if !lock.is_stored() {
        return Err(EditError::InvalidLock {
            task: task_id.to_string(),
            lock,
        });
    }
    Ok(())
}

/// Validate a complete predecessor list for `task_id`.
///
/// `check_cycles` is false for a task not yet in the graph: it has no
/// successors, so no edge into it can close a cycle.
fn validate_predecessors(
    working: &TaskGraph,
    task_id: &str,
    predecessors: &[Predecessor],
    check_cycles: bool,
) -> Result<(), EditError> {
    let mut seen = HashSet::new();

    for pred in predecessors {
        if pred.predecessor_id == task_id {
            return Err(EditError::SelfReference {
                task: task_id.to_string(),
            });
        }
        if !working.contains(&pred.predecessor_id) {
            return Err(EditError::UnknownPredecessor {
                id: pred.predecessor_id.clone(),
            });
        }
        if pred.lag_days.abs() > MAX_ABS_LAG_DAYS {
            return Err(EditError::InvalidLag {
                task: task_id.to_string(),
                predecessor: pred.predecessor_id.clone(),
                lag: pred.lag_days,
            });
        }
        if !seen.insert((pred.predecessor_id.as_str(), pred.dependency_type)) {
            return Err(EditError::DuplicatePredecessor {
                task: task_id.to_string(),
                predecessor: pred.predecessor_id.clone(),
                dependency_type: pred.dependency_type,
            });
        }
        if check_cycles {
            CycleValidator::validate_edge_addition(working, &pred.predecessor_id, task_id)?;
        }
    }

    Ok(())
}
