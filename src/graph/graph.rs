// src/graph/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::GraphError;
use crate::graph::task::{Predecessor, Task};
use crate::types::{Day, MAX_ABS_DAY, MAX_ABS_LAG_DAYS, MAX_DURATION_DAYS, TaskId};

/// Earliest start and latest end over a set of tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSpan {
    pub start: Day,
    pub end: Day,
}

/// In-memory task graph for one schedule.
///
/// Tasks own their predecessor lists; the graph keeps the reverse adjacency
/// (successors) next to them so forward traversal never scans every task.
/// A loaded graph is always acyclic, free of self-loops and dangling edges.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskId, Task>,
    successors: HashMap<TaskId, BTreeSet<TaskId>>,
}

impl TaskGraph {
    /// Build a graph from a flat snapshot.
    ///
    /// Fails if an id repeats, a predecessor is unknown or the task itself,
    /// a `(predecessor, type)` pair repeats, a value is out of range, or the
    /// relation contains a cycle.
    pub fn load(tasks: Vec<Task>) -> Result<Self, GraphError> {
        let mut by_id: HashMap<TaskId, Task> = HashMap::with_capacity(tasks.len());

        for task in tasks {
            check_bounds(&task)?;
            if by_id.contains_key(&task.id) {
                return Err(GraphError::DuplicateTask(task.id));
            }
            by_id.insert(task.id.clone(), task);
        }

        for task in by_id.values() {
            let mut seen = HashSet::new();
            for pred in &task.predecessors {
                if pred.predecessor_id == task.id {
                    return Err(GraphError::SelfReference(task.id.clone()));
                }
                if !by_id.contains_key(&pred.predecessor_id) {
                    return Err(GraphError::UnknownPredecessor {
                        task: task.id.clone(),
                        predecessor: pred.predecessor_id.clone(),
                    });
                }
                if !seen.insert((&pred.predecessor_id, pred.dependency_type)) {
                    return Err(GraphError::DuplicatePredecessor {
                        task: task.id.clone(),
                        predecessor: pred.predecessor_id.clone(),
                        dependency_type: pred.dependency_type,
                    });
                }
            }
        }

        let mut graph = Self {
            tasks: by_id,
            successors: HashMap::new(),
        };
        graph.rebuild_successors();
        graph.ensure_acyclic()?;

        debug!(tasks = graph.tasks.len(), "loaded task graph");
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// All tasks ordered by `(sequence_order, id)`.
    pub fn tasks(&self) -> Vec<&Task> {
        let mut all: Vec<&Task> = self.tasks.values().collect();
        all.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        all
    }

    /// Consume the graph, returning its tasks ordered by `(sequence_order, id)`.
    pub fn into_tasks(self) -> Vec<Task> {
        let mut all: Vec<Task> = self.tasks.into_values().collect();
        all.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        all
    }

    /// All tasks that list `task_id` as a predecessor, ordered by
    /// `(sequence_order, id)`.
    pub fn successors(&self, task_id: &str) -> Vec<&Task> {
        let mut out: Vec<&Task> = self
            .successor_ids(task_id)
            .filter_map(|id| self.tasks.get(id))
            .collect();
        out.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        out
    }

    /// Ids of the immediate successors of `task_id`, in id order.
    pub fn successor_ids(&self, task_id: &str) -> impl Iterator<Item = &TaskId> {
        self.successors.get(task_id).into_iter().flatten()
    }

    /// Tasks reachable forward from `starting_from` (seeds included), each
    /// placed after all of its predecessors that are also in the subset.
    ///
    /// Ties are broken by `(sequence_order, id)`, so a fixed input always
    /// yields the same order.
    pub fn topological_order(&self, starting_from: &[TaskId]) -> Result<Vec<&Task>, GraphError> {
        let ids = self.topological_ids(starting_from)?;
        Ok(ids.iter().filter_map(|id| self.tasks.get(id)).collect())
    }

    /// Topological order over every task in the graph.
    pub fn full_topological_order(&self) -> Result<Vec<&Task>, GraphError> {
        let seeds: Vec<TaskId> = self.tasks.keys().cloned().collect();
        self.topological_order(&seeds)
    }

    /// Kahn's algorithm restricted to the forward closure of `seeds`.
    pub(crate) fn topological_ids(&self, seeds: &[TaskId]) -> Result<Vec<TaskId>, GraphError> {
        let subset = self.forward_closure(seeds)?;

        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(subset.len());
        let mut ready: BTreeSet<(i64, &str)> = BTreeSet::new();

        for id in &subset {
            let Some(task) = self.tasks.get(id) else {
                continue;
            };
            let distinct_preds: BTreeSet<&str> = task
                .predecessors
                .iter()
                .map(|p| p.predecessor_id.as_str())
                .filter(|p| subset.contains(*p))
                .collect();
            in_degree.insert(task.id.as_str(), distinct_preds.len());
            if distinct_preds.is_empty() {
                ready.insert(task.order_key());
            }
        }

        let mut order = Vec::with_capacity(subset.len());

        while let Some((_, id)) = ready.pop_first() {
            order.push(id.to_string());

            for succ in self.successor_ids(id) {
                let Some(deg) = in_degree.get_mut(succ.as_str()) else {
                    continue;
                };
                *deg -= 1;
                if *deg == 0 {
                    if let Some(task) = self.tasks.get(succ) {
                        ready.insert(task.order_key());
                    }
                }
            }
        }

        if order.len() != subset.len() {
            let stuck = in_degree
                .iter()
                .filter(|(_, deg)| **deg > 0)
                .map(|(id, _)| *id)
                .min()
                .unwrap_or_default();
            return Err(GraphError::Cycle {
                path: self.cycle_through(stuck),
            });
        }

        Ok(order)
    }

    /// Shortest successor path `from -> ... -> to`, if one exists.
    ///
    /// Breadth-first with successors visited in id order, so the reported
    /// path is stable.
    pub fn find_path(&self, from: &str, to: &str) -> Option<Vec<TaskId>> {
        if !self.tasks.contains_key(from) || !self.tasks.contains_key(to) {
            return None;
        }
        if from == to {
            return Some(vec![from.to_string()]);
        }

        let mut parent: HashMap<&str, &str> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut queue: VecDeque<&str> = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            for succ in self.successor_ids(current) {
                let succ = succ.as_str();
                if !visited.insert(succ) {
                    continue;
                }
                parent.insert(succ, current);
                if succ == to {
                    let mut path = vec![to.to_string()];
                    let mut cursor = to;
                    while let Some(&prev) = parent.get(cursor) {
                        path.push(prev.to_string());
                        cursor = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(succ);
            }
        }

        None
    }

    /// Earliest start and latest end over all tasks.
    pub fn span(&self) -> Option<ScheduleSpan> {
        let start = self.tasks.values().map(|t| t.start_date).min()?;
        let end = self.tasks.values().map(Task::end_date).max()?;
        Some(ScheduleSpan { start, end })
    }

    pub(crate) fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Insert a task whose predecessors are already known to be valid.
    pub(crate) fn insert(&mut self, task: Task) {
        for pred in &task.predecessors {
            self.successors
                .entry(pred.predecessor_id.clone())
                .or_default()
                .insert(task.id.clone());
        }
        self.tasks.insert(task.id.clone(), task);
    }

    /// Remove a task that has no successors.
    pub(crate) fn remove(&mut self, id: &str) -> Option<Task> {
        let task = self.tasks.remove(id)?;
        for pred in &task.predecessors {
            if let Some(succs) = self.successors.get_mut(&pred.predecessor_id) {
                succs.remove(id);
            }
        }
        self.successors.remove(id);
        Some(task)
    }

    /// Swap in a new predecessor list (already validated) and return the old
    /// one.
    pub(crate) fn replace_predecessors(
        &mut self,
        id: &str,
        predecessors: Vec<Predecessor>,
    ) -> Option<Vec<Predecessor>> {
        let task = self.tasks.get_mut(id)?;
        let old = std::mem::replace(&mut task.predecessors, predecessors);

        for pred in &old {
            if let Some(succs) = self.successors.get_mut(&pred.predecessor_id) {
                succs.remove(id);
            }
        }
        let new_preds: Vec<TaskId> = task
            .predecessors
            .iter()
            .map(|p| p.predecessor_id.clone())
            .collect();
        for pred_id in new_preds {
            self.successors.entry(pred_id).or_default().insert(id.to_string());
        }

        Some(old)
    }

    fn rebuild_successors(&mut self) {
        self.successors.clear();
        for task in self.tasks.values() {
            for pred in &task.predecessors {
                self.successors
                    .entry(pred.predecessor_id.clone())
                    .or_default()
                    .insert(task.id.clone());
            }
        }
    }

    fn forward_closure(&self, seeds: &[TaskId]) -> Result<HashSet<TaskId>, GraphError> {
        let mut visited: HashSet<TaskId> = HashSet::new();
        let mut stack: Vec<&str> = Vec::with_capacity(seeds.len());

        for seed in seeds {
            if !self.tasks.contains_key(seed) {
                return Err(GraphError::TaskNotFound(seed.clone()));
            }
            stack.push(seed.as_str());
        }

        while let Some(id) = stack.pop() {
            if !visited.insert(id.to_string()) {
                continue;
            }
            stack.extend(self.successor_ids(id).map(String::as_str));
        }

        Ok(visited)
    }

    fn ensure_acyclic(&self) -> Result<(), GraphError> {
        // Edge direction: predecessor -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in self.tasks.keys() {
            graph.add_node(id.as_str());
        }
        for (pred, succs) in &self.successors {
            for succ in succs {
                graph.add_edge(pred.as_str(), succ.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(GraphError::Cycle {
                path: self.cycle_through(cycle.node_id()),
            }),
        }
    }

    /// A closed path `node -> ... -> node`, or just `[node]` if none is found.
    fn cycle_through(&self, node: &str) -> Vec<TaskId> {
        for succ in self.successor_ids(node) {
            if let Some(mut path) = self.find_path(succ, node) {
                path.insert(0, node.to_string());
                return path;
            }
        }
        vec![node.to_string()]
    }
}

fn check_bounds(task: &Task) -> Result<(), GraphError> {
    if task.start_date.abs() > MAX_ABS_DAY {
        return Err(GraphError::DateOutOfRange {
            task: task.id.clone(),
            start: task.start_date,
        });
    }
    if task.duration_days > MAX_DURATION_DAYS {
        return Err(GraphError::DurationOutOfRange {
            task: task.id.clone(),
            duration: task.duration_days,
        });
    }
    if let Some(lock) = task.lock.filter(|lock| !lock.is_stored()) {
        return Err(GraphError::InvalidLock {
            task: task.id.clone(),
            lock,
        });
    }
    for pred in &task.predecessors {
        if pred.lag_days.abs() > MAX_ABS_LAG_DAYS {
            return Err(GraphError::LagOutOfRange {
                task: task.id.clone(),
                predecessor: pred.predecessor_id.clone(),
                lag: pred.lag_days,
            });
        }
    }
    Ok(())
}
