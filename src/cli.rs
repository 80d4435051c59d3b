// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::graph::TaskLock;
use crate::types::Day;

/// Command-line arguments for `gantt-cascade`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gantt-cascade",
    version,
    about = "Edit a task schedule and cascade date changes through its dependencies.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the schedule file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Schedule.toml", global = true)]
    pub schedule: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GANTT_CASCADE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// Write the result back to the schedule file. Without this flag edits
    /// run against an in-memory copy and only print the update set.
    #[arg(long, global = true)]
    pub write: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print every task in topological order.
    Show,

    /// Fail if any task is out of date or a pinned task breaks a dependency.
    Check,

    /// Recompute every task from scratch.
    Recalculate,

    /// Change a task's duration.
    Duration {
        task: String,
        #[arg(allow_hyphen_values = true)]
        days: i64,
    },

    /// Move a task to a new start day. The task becomes manually positioned.
    Start {
        task: String,
        #[arg(allow_hyphen_values = true)]
        day: Day,
    },

    /// Replace a task's predecessors, e.g. `footings excavationFS+1 surveySS`.
    Predecessors {
        task: String,
        #[arg(value_name = "PRED")]
        predecessors: Vec<String>,
        /// Remove every predecessor.
        #[arg(long, conflicts_with = "predecessors")]
        clear: bool,
    },

    /// Mark a task as manually positioned.
    Pin { task: String },

    /// Let the cascade place a task again.
    Unpin { task: String },

    /// Lock a task: supplier_confirm, confirm, started or completed.
    Lock {
        task: String,
        #[arg(value_name = "LOCK")]
        lock: TaskLock,
    },

    /// Clear a task's lock. Started and completed tasks stay locked.
    Unlock { task: String },

    /// Add a new task.
    Add {
        task: String,
        #[arg(long)]
        duration: i64,
        /// Predecessors in display notation.
        #[arg(long, value_name = "PRED", num_args = 1..)]
        after: Vec<String>,
    },

    /// Delete a task. It must not be anyone's predecessor.
    Delete { task: String },

    /// Copy the schedule as a template anchored at a project start day.
    Instantiate {
        #[arg(long, value_name = "DAY", allow_hyphen_values = true)]
        project_start: Day,
        #[arg(long, value_name = "PATH")]
        out: String,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
