// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task identifier type, unique within one schedule.
pub type TaskId = String;

/// Identifier of one schedule (a project's task graph or a template's).
pub type ScheduleId = String;

/// Signed calendar-day offset from the schedule's reference date.
pub type Day = i64;

/// Largest absolute day offset accepted at the edit boundary.
pub const MAX_ABS_DAY: Day = 3_650_000;

/// Largest task duration accepted at the edit boundary.
pub const MAX_DURATION_DAYS: u32 = 36_500;

/// Largest absolute lag accepted on a predecessor relation.
pub const MAX_ABS_LAG_DAYS: i64 = 36_500;

/// How a successor's start is constrained by one predecessor.
///
/// Only finish-to-start and start-to-start are scheduled. The other two
/// classic relation types (`FF`, `SF`) are recognised so they can be
/// rejected with a clear message instead of being silently treated as `FS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DependencyType {
    FinishToStart,
    StartToStart,
}

impl DependencyType {
    /// Short code used in the display notation and in schedule files.
    pub fn code(self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
        }
    }
}

impl Default for DependencyType {
    fn default() -> Self {
        DependencyType::FinishToStart
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fs" | "finish_to_start" => Ok(DependencyType::FinishToStart),
            "ss" | "start_to_start" => Ok(DependencyType::StartToStart),
            "ff" | "sf" | "finish_to_finish" | "start_to_finish" => Err(format!(
                "unsupported dependency type: {} (only \"FS\" and \"SS\" are scheduled)",
                s.trim()
            )),
            other => Err(format!(
                "invalid dependency type: {other} (expected \"FS\" or \"SS\")"
            )),
        }
    }
}

impl TryFrom<String> for DependencyType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DependencyType> for String {
    fn from(value: DependencyType) -> Self {
        value.code().to_string()
    }
}
