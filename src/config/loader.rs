// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawScheduleFile, ScheduleFile};
use crate::errors::Result;

/// Load a schedule file from a given path and return the raw `RawScheduleFile`.
///
/// This only performs TOML deserialization; it does **not** check the task
/// graph. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawScheduleFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let schedule: RawScheduleFile = toml::from_str(&contents)?;

    Ok(schedule)
}

/// Load a schedule file and validate it.
///
/// - Reads TOML; unknown dependency types fail here.
/// - Checks durations and ids.
/// - Builds the task graph, rejecting unknown or duplicate predecessors,
///   self-references and cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ScheduleFile> {
    let raw = load_from_path(&path)?;
    let schedule = ScheduleFile::try_from(raw)?;
    debug!(
        path = %path.as_ref().display(),
        tasks = schedule.graph.len(),
        "loaded schedule file"
    );
    Ok(schedule)
}

/// Write a schedule file.
///
/// The body goes to a sibling temp file first and is renamed over `path`, so
/// a reader never sees a half-written schedule.
pub fn save_to_path(path: impl AsRef<Path>, schedule: &RawScheduleFile) -> Result<()> {
    let path = path.as_ref();
    let body = toml::to_string_pretty(schedule)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;

    debug!(path = %path.display(), tasks = schedule.task.len(), "wrote schedule file");
    Ok(())
}

/// Default schedule path: `Schedule.toml` in the current working directory.
pub fn default_schedule_path() -> PathBuf {
    PathBuf::from("Schedule.toml")
}
