// src/store/file.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use super::ScheduleStore;
use crate::cascade::UpdateSet;
use crate::config::{RawScheduleFile, load_from_path, save_to_path, validate_schedule};
use crate::graph::Task;

/// Stores each schedule as `<root>/<schedule>.toml`.
///
/// The `[config]` section of an existing file is preserved across commits.
#[derive(Debug, Clone)]
pub struct FileScheduleStore {
    root: PathBuf,
}

impl FileScheduleStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `schedule`.
    pub fn path_for(&self, schedule: &str) -> Result<PathBuf> {
        if schedule.is_empty()
            || schedule.contains(['/', '\\'])
            || schedule == "."
            || schedule == ".."
        {
            bail!("invalid schedule id: {schedule:?}");
        }
        Ok(self.root.join(format!("{schedule}.toml")))
    }

    fn read_raw(&self, schedule: &str) -> Result<(PathBuf, RawScheduleFile)> {
        let path = self.path_for(schedule)?;
        let raw = load_from_path(&path)
            .with_context(|| format!("reading schedule {:?}", path))?;
        Ok((path, raw))
    }
}

impl ScheduleStore for FileScheduleStore {
    fn load(&self, schedule: &str) -> Result<Vec<Task>> {
        let (path, raw) = self.read_raw(schedule)?;
        let tasks = validate_schedule(&raw).with_context(|| format!("validating schedule {:?}", path))?;
        Ok(tasks)
    }

    fn commit(&self, schedule: &str, updates: &UpdateSet) -> Result<()> {
        let (path, raw) = self.read_raw(schedule)?;
        let mut tasks = validate_schedule(&raw).with_context(|| format!("validating schedule {:?}", path))?;

        updates.apply_to(&mut tasks)?;

        let body = RawScheduleFile::from_tasks(raw.config, &tasks);
        save_to_path(&path, &body).with_context(|| format!("writing schedule {:?}", path))?;

        info!(
            schedule = %schedule,
            updated = updates.updates.len(),
            created = updates.created.len(),
            removed = updates.removed.len(),
            "committed update set (file)"
        );
        Ok(())
    }
}
