// src/store/mod.rs

//! Durable storage of schedule rows.
//!
//! The engine reads one full snapshot per transaction and writes back only
//! the computed [`UpdateSet`], as a single batch.

use anyhow::Result;

use crate::cascade::UpdateSet;
use crate::graph::Task;

pub mod file;
pub mod memory;

pub use file::FileScheduleStore;
pub use memory::MemoryScheduleStore;

/// Abstract storage for schedules.
pub trait ScheduleStore: Send + Sync {
    /// Every task row of `schedule`.
    fn load(&self, schedule: &str) -> Result<Vec<Task>>;

    /// Persist one transaction's update set atomically: all rows or none.
    fn commit(&self, schedule: &str, updates: &UpdateSet) -> Result<()>;
}
