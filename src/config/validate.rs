// src/config/validate.rs

use crate::config::model::{RawScheduleFile, ScheduleFile, TaskConfig};
use crate::errors::{CascadeError, Result};
use crate::graph::{Task, TaskGraph};
use crate::types::{MAX_DURATION_DAYS, TaskId};

impl TryFrom<RawScheduleFile> for ScheduleFile {
    type Error = CascadeError;

    fn try_from(raw: RawScheduleFile) -> std::result::Result<Self, Self::Error> {
        let tasks = validate_schedule(&raw)?;
        let graph = TaskGraph::load(tasks)?;
        Ok(ScheduleFile::new_unchecked(raw.config, graph))
    }
}

/// Check the per-task fields of a raw schedule and convert them to task
/// rows. Structural checks (unknown / duplicate predecessors, cycles) are
/// left to [`TaskGraph::load`].
pub fn validate_schedule(raw: &RawScheduleFile) -> Result<Vec<Task>> {
    raw.task
        .iter()
        .map(|(id, cfg)| task_from_config(id, cfg))
        .collect()
}

fn task_from_config(id: &TaskId, cfg: &TaskConfig) -> Result<Task> {
    if id.trim().is_empty() {
        return Err(CascadeError::ConfigError(
            "task ids must not be empty".to_string(),
        ));
    }

    let duration_days = u32::try_from(cfg.duration)
        .ok()
        .filter(|d| *d <= MAX_DURATION_DAYS)
        .ok_or_else(|| {
            CascadeError::ConfigError(format!(
                "task '{}' has invalid duration {} (expected 0..={})",
                id, cfg.duration, MAX_DURATION_DAYS
            ))
        })?;

    Ok(Task {
        id: id.clone(),
        duration_days,
        start_date: cfg.start,
        predecessors: cfg.predecessors.clone(),
        manually_positioned: cfg.manually_positioned,
        dependencies_broken: cfg.dependencies_broken,
        sequence_order: cfg.sequence,
        lock: cfg.lock,
    })
}
