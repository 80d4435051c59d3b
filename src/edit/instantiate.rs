// src/edit/instantiate.rs

//! Turning a schedule template into a project schedule.

use tracing::info;

use crate::cascade::{CascadeEngine, CascadeOptions};
use crate::errors::GraphError;
use crate::graph::{ScheduleSpan, Task, TaskGraph};
use crate::types::{Day, TaskId};

/// A freshly instantiated project schedule.
#[derive(Debug, Clone)]
pub struct Instantiation {
    pub graph: TaskGraph,
    /// Earliest start / latest end, for the project's own dates. `None` for
    /// an empty template.
    pub span: Option<ScheduleSpan>,
}

/// Copy every template task into a new schedule starting at `project_start`.
///
/// Ids, durations, predecessors and sequence order are kept; pins, locks and
/// broken flags are cleared. Tasks without predecessors start at `project_start`,
/// all others at the latest of `project_start` and their constraint bounds.
pub fn instantiate(template: &TaskGraph, project_start: Day, options: CascadeOptions) -> Result<Instantiation, GraphError> {
    let tasks: Vec<Task> = template
        .tasks()
        .into_iter()
        .cloned()
        .map(|mut task| {
            task.start_date = project_start;
            task.manually_positioned = false;
            task.lock = None;
            task.dependencies_broken = false;
            task
        })
        .collect();

    let mut graph = TaskGraph::load(tasks)?;
    let seeds: Vec<TaskId> = graph.tasks().into_iter().map(|t| t.id.clone()).collect();

    CascadeEngine::new(options).recompute_with_floor(&mut graph, &seeds, Some(project_start))?;

    let span = graph.span();
    info!(
        tasks = graph.len(),
        project_start,
        end = ?span.map(|s| s.end),
        "instantiated template"
    );

    Ok(Instantiation { graph, span })
}
