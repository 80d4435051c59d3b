// src/cascade/engine.rs

//! Single forward pass that recomputes dates downstream of changed tasks.
//!
//! The pass is a pure function of a graph snapshot and a dirty set: it visits
//! each affected task once, in topological order, and never schedules further
//! work for itself. Termination is therefore bounded by O(V + E).

use tracing::{debug, info, warn};

use crate::cascade::update::UpdateSet;
use crate::errors::GraphError;
use crate::graph::{Predecessor, Task, TaskGraph, TaskLock};
use crate::types::{Day, DependencyType, MAX_ABS_DAY, TaskId};

/// Tunables for constraint evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOptions {
    /// Never let a finish-to-start successor start before its predecessor's
    /// start, however negative the lag.
    pub predecessor_start_floor: bool,
}

impl Default for CascadeOptions {
    fn default() -> Self {
        Self {
            predecessor_start_floor: true,
        }
    }
}

/// One predecessor edge whose constraint the successor currently violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub task_id: TaskId,
    pub predecessor_id: TaskId,
    pub dependency_type: DependencyType,
    pub lag_days: i64,
    pub required_start: Day,
    pub actual_start: Day,
    /// Strongest lock holding the successor in place, if any.
    pub lock: Option<TaskLock>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CascadeEngine {
    options: CascadeOptions,
}

impl CascadeEngine {
    pub fn new(options: CascadeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> CascadeOptions {
        self.options
    }

    /// Earliest start `successor` may take with respect to one relation.
    pub fn edge_bound(&self, predecessor: &Task, relation: &Predecessor) -> Day {
        match relation.dependency_type {
            DependencyType::FinishToStart => {
                let bound = predecessor.end_date() + relation.lag_days;
                if self.options.predecessor_start_floor {
                    bound.max(predecessor.start_date)
                } else {
                    bound
                }
            }
            DependencyType::StartToStart => predecessor.start_date + relation.lag_days,
        }
    }

    /// Maximum bound over all of `task`'s relations, or `None` when it has no
    /// predecessors.
    pub fn required_start(&self, graph: &TaskGraph, task: &Task) -> Option<Day> {
        task.predecessors
            .iter()
            .filter_map(|rel| {
                graph
                    .get(&rel.predecessor_id)
                    .map(|pred| self.edge_bound(pred, rel))
            })
            .max()
    }

    /// Recompute every task reachable from `dirty`, in place.
    ///
    /// Returns the visited tasks in the order they were processed. Fails with
    /// [`GraphError::DateOutOfRange`] if a task would have to start beyond
    /// `MAX_ABS_DAY`; tasks visited before it are left moved, so callers
    /// that must not observe a partial pass use [`cascade`](Self::cascade).
    pub fn recompute(&self, graph: &mut TaskGraph, dirty: &[TaskId]) -> Result<Vec<TaskId>, GraphError> {
        self.recompute_with_floor(graph, dirty, None)
    }

    /// As [`recompute`](Self::recompute), additionally keeping every
    /// unlocked task at or after `floor` (tasks without predecessors start
    /// exactly there).
    pub(crate) fn recompute_with_floor(
        &self,
        graph: &mut TaskGraph,
        dirty: &[TaskId],
        floor: Option<Day>,
    ) -> Result<Vec<TaskId>, GraphError> {
        let order = graph.topological_ids(dirty)?;
        let mut moved = 0usize;
        let mut broken = 0usize;

        for id in &order {
            let Some(task) = graph.get(id) else {
                continue;
            };
            let required = match (self.required_start(graph, task), floor) {
                (Some(r), Some(f)) => Some(r.max(f)),
                (None, Some(f)) => Some(f),
                (r, None) => r,
            };

            let Some(task) = graph.task_mut(id) else {
                continue;
            };

            if task.is_locked() {
                let violated = required.is_some_and(|r| r > task.start_date);
                if violated && !task.dependencies_broken {
                    warn!(
                        task = %task.id,
                        lock = ?task.strongest_lock(),
                        start = task.start_date,
                        required = ?required,
                        "locked task now violates a predecessor constraint"
                    );
                }
                task.dependencies_broken = violated;
                if violated {
                    broken += 1;
                }
            } else {
                if let Some(start) = required {
                    if start.abs() > MAX_ABS_DAY {
                        warn!(task = %task.id, start, "cascade pushed task out of range");
                        return Err(GraphError::DateOutOfRange {
                            task: task.id.clone(),
                            start,
                        });
                    }
                    if start != task.start_date {
                        debug!(task = %task.id, from = task.start_date, to = start, "moving task");
                        task.start_date = start;
                        moved += 1;
                    }
                }
                task.dependencies_broken = false;
            }
        }

        info!(
            dirty = dirty.len(),
            visited = order.len(),
            moved,
            broken,
            "cascade complete"
        );
        Ok(order)
    }

    /// Pure form of the cascade: returns the recomputed graph and the
    /// minimal set of changed rows, leaving `graph` untouched.
    pub fn cascade(&self, graph: &TaskGraph, dirty: &[TaskId]) -> Result<(TaskGraph, UpdateSet), GraphError> {
        let mut working = graph.clone();
        let order = self.recompute(&mut working, dirty)?;
        let updates = UpdateSet::between(graph, &working, &order, Vec::new());
        Ok((working, updates))
    }

    /// Every edge whose constraint is currently violated, in
    /// `(sequence_order, id)` order of the successor.
    pub fn violations(&self, graph: &TaskGraph) -> Vec<ConstraintViolation> {
        let mut out = Vec::new();

        for task in graph.tasks() {
            for rel in &task.predecessors {
                let Some(pred) = graph.get(&rel.predecessor_id) else {
                    continue;
                };
                let required = self.edge_bound(pred, rel);
                if required > task.start_date {
                    out.push(ConstraintViolation {
                        task_id: task.id.clone(),
                        predecessor_id: rel.predecessor_id.clone(),
                        dependency_type: rel.dependency_type,
                        lag_days: rel.lag_days,
                        required_start: required,
                        actual_start: task.start_date,
                        lock: task.strongest_lock(),
                    });
                }
            }
        }

        out
    }
}
