// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cascade::CascadeOptions;
use crate::graph::{Predecessor, Task, TaskGraph, TaskLock};
use crate::types::{Day, TaskId};

/// Schedule file as read from TOML.
///
/// ```toml
/// [config]
/// name = "Lot 12 - slab"
/// predecessor_start_floor = true
///
/// [task.excavation]
/// duration = 2
/// start = 0
///
/// [task.footings]
/// duration = 3
/// sequence = 1
/// predecessors = [{ id = "excavation", type = "FS", lag = 1 }]
/// ```
///
/// This is the raw, unvalidated mapping. Use
/// [`ScheduleFile::try_from`] (or `loader::load_and_validate`) to get a
/// schedule whose graph is known to be well formed.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawScheduleFile {
    /// Schedule-wide behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[task.<id>]`; keys are the task ids.
    #[serde(default)]
    pub task: BTreeMap<TaskId, TaskConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfigSection {
    /// Display name of the project or template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Floor finish-to-start successors at their predecessor's start when a
    /// negative lag would pull them earlier.
    #[serde(default = "default_predecessor_start_floor")]
    pub predecessor_start_floor: bool,
}

fn default_predecessor_start_floor() -> bool {
    true
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            name: None,
            predecessor_start_floor: default_predecessor_start_floor(),
        }
    }
}

impl ConfigSection {
    pub fn cascade_options(&self) -> CascadeOptions {
        CascadeOptions {
            predecessor_start_floor: self.predecessor_start_floor,
        }
    }
}

/// `[task.<id>]` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskConfig {
    /// Duration in calendar days. Kept signed here so a negative value can
    /// be reported as such instead of as a TOML type error.
    pub duration: i64,

    /// Start day offset.
    #[serde(default)]
    pub start: Day,

    /// Display / tie-break ordering.
    #[serde(default)]
    pub sequence: i64,

    /// Full predecessor list, `{ id, type, lag }` entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predecessors: Vec<Predecessor>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub manually_positioned: bool,

    /// Written by the engine; read back so unchanged rows diff as unchanged.
    #[serde(default, skip_serializing_if = "is_false")]
    pub dependencies_broken: bool,

    /// `supplier_confirm`, `confirm`, `started` or `completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<TaskLock>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<&Task> for TaskConfig {
    fn from(task: &Task) -> Self {
        Self {
            duration: i64::from(task.duration_days),
            start: task.start_date,
            sequence: task.sequence_order,
            predecessors: task.predecessors.clone(),
            manually_positioned: task.manually_positioned,
            dependencies_broken: task.dependencies_broken,
            lock: task.lock,
        }
    }
}

impl RawScheduleFile {
    /// Build a file body from a config section and task rows.
    pub fn from_tasks<'a>(config: ConfigSection, tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let task = tasks
            .into_iter()
            .map(|t| (t.id.clone(), TaskConfig::from(t)))
            .collect();
        Self { config, task }
    }
}

/// A validated schedule file.
#[derive(Debug, Clone)]
pub struct ScheduleFile {
    pub config: ConfigSection,
    pub graph: TaskGraph,
}

impl ScheduleFile {
    /// Construct without validation; only `validate` should call this.
    pub(crate) fn new_unchecked(config: ConfigSection, graph: TaskGraph) -> Self {
        Self { config, graph }
    }

    pub fn options(&self) -> CascadeOptions {
        self.config.cascade_options()
    }

    /// Raw form for writing back to disk.
    pub fn to_raw(&self) -> RawScheduleFile {
        RawScheduleFile::from_tasks(self.config.clone(), self.graph.tasks())
    }
}
