// src/store/memory.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use tracing::debug;

use super::ScheduleStore;
use crate::cascade::UpdateSet;
use crate::graph::Task;
use crate::types::ScheduleId;

/// Keeps schedules in memory only (lost on restart).
///
/// Used for dry runs and tests. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryScheduleStore {
    schedules: Arc<Mutex<HashMap<ScheduleId, Vec<Task>>>>,
    commits: Arc<AtomicUsize>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed (or replace) a schedule.
    pub fn insert(&self, schedule: &str, tasks: Vec<Task>) {
        self.lock().insert(schedule.to_string(), tasks);
    }

    /// Current rows of a schedule, if it exists.
    pub fn tasks(&self, schedule: &str) -> Option<Vec<Task>> {
        self.lock().get(schedule).cloned()
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ScheduleId, Vec<Task>>> {
        self.schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ScheduleStore for MemoryScheduleStore {
    fn load(&self, schedule: &str) -> Result<Vec<Task>> {
        self.lock()
            .get(schedule)
            .cloned()
            .ok_or_else(|| anyhow!("unknown schedule: {schedule}"))
    }

    fn commit(&self, schedule: &str, updates: &UpdateSet) -> Result<()> {
        let mut schedules = self.lock();
        let rows = schedules
            .get_mut(schedule)
            .ok_or_else(|| anyhow!("unknown schedule: {schedule}"))?;

        // Apply to a copy so a failed batch leaves the stored rows untouched.
        let mut next = rows.clone();
        updates.apply_to(&mut next)?;
        *rows = next;

        self.commits.fetch_add(1, Ordering::SeqCst);
        debug!(schedule = %schedule, rows = updates.len(), "committed update set (memory)");
        Ok(())
    }
}
