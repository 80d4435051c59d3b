#![allow(dead_code)]

use gantt_cascade::config::{ConfigSection, RawScheduleFile};
use gantt_cascade::graph::{Predecessor, Task, TaskGraph, TaskLock};
use gantt_cascade::store::MemoryScheduleStore;
use gantt_cascade::types::Day;

/// Builder for a single `Task` row.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    task: Task,
    sequence: Option<i64>,
}

impl TaskBuilder {
    /// A one-day, unpinned task starting on day 0.
    pub fn new(id: &str) -> Self {
        Self {
            task: Task::new(id, 1, 0),
            sequence: None,
        }
    }

    pub fn duration(mut self, days: u32) -> Self {
        self.task.duration_days = days;
        self
    }

    pub fn start(mut self, day: Day) -> Self {
        self.task.start_date = day;
        self
    }

    /// Finish-to-start, no lag.
    pub fn after(self, pred: &str) -> Self {
        self.after_fs(pred, 0)
    }

    pub fn after_fs(mut self, pred: &str, lag: i64) -> Self {
        self.task
            .predecessors
            .push(Predecessor::finish_to_start(pred, lag));
        self
    }

    pub fn after_ss(mut self, pred: &str, lag: i64) -> Self {
        self.task
            .predecessors
            .push(Predecessor::start_to_start(pred, lag));
        self
    }

    pub fn pinned(mut self) -> Self {
        self.task.manually_positioned = true;
        self
    }

    pub fn locked(mut self, lock: TaskLock) -> Self {
        self.task.lock = Some(lock);
        self
    }

    pub fn broken(mut self) -> Self {
        self.task.dependencies_broken = true;
        self
    }

    pub fn sequence(mut self, order: i64) -> Self {
        self.sequence = Some(order);
        self
    }

    pub fn build(self) -> Task {
        let mut task = self.task;
        if let Some(order) = self.sequence {
            task.sequence_order = order;
        }
        task
    }
}

/// Builder for a whole schedule.
///
/// Tasks without an explicit `sequence` get their insertion index.
#[derive(Debug, Clone, Default)]
pub struct ScheduleBuilder {
    tasks: Vec<Task>,
    config: ConfigSection,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, builder: TaskBuilder) -> Self {
        let index = self.tasks.len() as i64;
        let explicit = builder.sequence.is_some();
        let mut task = builder.build();
        if !explicit {
            task.sequence_order = index;
        }
        self.tasks.push(task);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.config.name = Some(name.to_string());
        self
    }

    pub fn predecessor_start_floor(mut self, enabled: bool) -> Self {
        self.config.predecessor_start_floor = enabled;
        self
    }

    pub fn build_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn build_graph(self) -> TaskGraph {
        TaskGraph::load(self.tasks).expect("Failed to build valid graph from builder")
    }

    pub fn build_raw(self) -> RawScheduleFile {
        RawScheduleFile::from_tasks(self.config, &self.tasks)
    }

    /// A memory store holding this schedule under `schedule`.
    pub fn build_store(self, schedule: &str) -> MemoryScheduleStore {
        let store = MemoryScheduleStore::new();
        store.insert(schedule, self.tasks);
        store
    }
}
