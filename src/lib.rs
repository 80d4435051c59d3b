// src/lib.rs

pub mod cascade;
pub mod cli;
pub mod config;
pub mod edit;
pub mod errors;
pub mod graph;
pub mod logging;
pub mod service;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::cascade::{CascadeEngine, UpdateSet};
use crate::cli::{CliArgs, Command};
use crate::config::{RawScheduleFile, ScheduleFile, load_and_validate, save_to_path};
use crate::edit::{EditTransaction, TaskEdit, instantiate};
use crate::errors::EditError;
use crate::graph::{Predecessor, Task, TaskGraph, parse_predecessor_list};
use crate::service::ScheduleService;
use crate::store::{FileScheduleStore, MemoryScheduleStore, ScheduleStore};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the schedule file, then runs one command against it.
/// Edits go through [`ScheduleService`]: backed by the file itself with
/// `--write`, otherwise by an in-memory copy.
pub async fn run(args: CliArgs) -> Result<()> {
    let schedule_path = PathBuf::from(&args.schedule);
    let schedule = load_and_validate(&schedule_path)
        .with_context(|| format!("loading schedule {:?}", schedule_path))?;

    let request = match args.command {
        Command::Show => {
            print_schedule(&schedule)?;
            return Ok(());
        }
        Command::Check => return check(&schedule),
        Command::Instantiate { project_start, out } => {
            return write_instance(&schedule, project_start, Path::new(&out));
        }
        Command::Recalculate => Request::Recalculate,
        other => Request::Edits(edits_for(&schedule.graph, other)?),
    };

    let schedule_id = schedule_id(&schedule_path)?;
    let updates = if args.write {
        let root = schedule_root_dir(&schedule_path);
        let service = ScheduleService::new(FileScheduleStore::new(root), schedule.options());
        execute(&service, &schedule_id, request).await?
    } else {
        let store = MemoryScheduleStore::new();
        store.insert(&schedule_id, schedule.graph.clone().into_tasks());
        let service = ScheduleService::new(store, schedule.options());
        execute(&service, &schedule_id, request).await?
    };

    print_updates(&updates);
    if !args.write && !updates.is_empty() {
        println!("(dry run: pass --write to save)");
    }
    Ok(())
}

enum Request {
    Edits(Vec<TaskEdit>),
    Recalculate,
}

async fn execute<S: ScheduleStore>(
    service: &ScheduleService<S>,
    schedule_id: &str,
    request: Request,
) -> Result<UpdateSet> {
    let updates = match request {
        Request::Edits(edits) => service.apply_batch(schedule_id, edits).await?,
        Request::Recalculate => service.recalculate(schedule_id).await?,
    };
    Ok(updates)
}

/// Translate an edit subcommand into the transaction's edit list.
fn edits_for(graph: &TaskGraph, command: Command) -> Result<Vec<TaskEdit>> {
    let edit = match command {
        Command::Duration { task, days } => TaskEdit::ChangeDuration {
            task_id: task,
            duration_days: days,
        },
        Command::Start { task, day } => TaskEdit::ChangeStartDate {
            task_id: task,
            start_date: day,
        },
        Command::Predecessors {
            task,
            predecessors,
            clear,
        } => {
            if predecessors.is_empty() && !clear {
                bail!("no predecessors given for '{task}'; pass --clear to remove them all");
            }
            TaskEdit::SetPredecessors {
                task_id: task,
                predecessors: parse_notation(&predecessors)?,
            }
        }
        Command::Pin { task } => TaskEdit::MarkManuallyPositioned {
            task_id: task,
            manually_positioned: true,
        },
        Command::Unpin { task } => TaskEdit::MarkManuallyPositioned {
            task_id: task,
            manually_positioned: false,
        },
        Command::Lock { task, lock } => TaskEdit::SetLock {
            task_id: task,
            lock: Some(lock),
        },
        Command::Unlock { task } => TaskEdit::SetLock {
            task_id: task,
            lock: None,
        },
        Command::Add {
            task,
            duration,
            after,
        } => {
            let duration_days = u32::try_from(duration).map_err(|_| EditError::InvalidDuration {
                task: task.clone(),
                duration,
            })?;
            let start = graph.span().map(|span| span.start).unwrap_or(0);
            let mut new_task = Task::new(task, duration_days, start);
            new_task.predecessors = parse_notation(&after)?;
            new_task.sequence_order = graph
                .tasks()
                .iter()
                .map(|t| t.sequence_order)
                .max()
                .map_or(0, |max| max + 1);
            TaskEdit::AddTask { task: new_task }
        }
        Command::Delete { task } => TaskEdit::Delete { task_id: task },
        Command::Show | Command::Check | Command::Recalculate | Command::Instantiate { .. } => {
            bail!("not an edit command")
        }
    };
    Ok(vec![edit])
}

fn parse_notation(entries: &[String]) -> Result<Vec<Predecessor>> {
    let mut parsed = Vec::new();
    for entry in entries {
        parsed.extend(parse_predecessor_list(entry).map_err(|e| anyhow!(e))?);
    }
    Ok(parsed)
}

/// Fail when the stored dates are stale or a pinned task breaks a dependency.
fn check(schedule: &ScheduleFile) -> Result<()> {
    let engine = CascadeEngine::new(schedule.options());
    let violations = engine.violations(&schedule.graph);
    for v in &violations {
        let held = v.lock.map(|lock| format!(" ({lock})")).unwrap_or_default();
        println!(
            "violation: {}{} needs {}{}{:+} -> start >= {}, but starts at {}",
            v.task_id, held, v.predecessor_id, v.dependency_type, v.lag_days, v.required_start, v.actual_start
        );
    }

    let drift = EditTransaction::new(schedule.options()).recalculate_all(&schedule.graph)?;
    if !drift.updates.is_empty() {
        print_updates(&drift.updates);
        bail!(
            "schedule is out of date: {} task(s) would change on recalculation",
            drift.updates.len()
        );
    }

    let locked_violations = violations.len();
    if locked_violations > 0 {
        bail!("{locked_violations} dependency violation(s) on locked tasks");
    }

    info!(tasks = schedule.graph.len(), "schedule is consistent");
    println!("ok: {} task(s), no violations", schedule.graph.len());
    Ok(())
}

/// Instantiate the schedule as a template and write the copy to `out`.
fn write_instance(schedule: &ScheduleFile, project_start: i64, out: &Path) -> Result<()> {
    let instance = instantiate(&schedule.graph, project_start, schedule.options())?;
    let raw = RawScheduleFile::from_tasks(schedule.config.clone(), instance.graph.tasks());
    save_to_path(out, &raw).with_context(|| format!("writing instance {:?}", out))?;

    match instance.span {
        Some(span) => println!(
            "instantiated {} task(s) into {}: days {}..{}",
            instance.graph.len(),
            out.display(),
            span.start,
            span.end
        ),
        None => println!("instantiated empty schedule into {}", out.display()),
    }
    Ok(())
}

/// Schedule id used by the stores: the file stem of the schedule path.
fn schedule_id(path: &Path) -> Result<String> {
    if path.extension().and_then(|e| e.to_str()) != Some("toml") {
        bail!("schedule file must have a .toml extension: {:?}", path);
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("cannot derive a schedule id from {:?}", path))
}

/// Directory holding the schedule file, or the current directory for a bare
/// file name.
fn schedule_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_schedule(schedule: &ScheduleFile) -> Result<()> {
    if let Some(name) = &schedule.config.name {
        println!("{name}");
    }
    println!("tasks ({}):", schedule.graph.len());
    for task in schedule.graph.full_topological_order()? {
        let mut flags = Vec::new();
        if let Some(lock) = task.lock {
            flags.push(lock.code());
        }
        if task.manually_positioned {
            flags.push("pinned");
        }
        if task.dependencies_broken {
            flags.push("dependencies broken");
        }
        println!(
            "  - {:<16} days {:>5}..{:<5} ({}d)  after: {}{}",
            task.id,
            task.start_date,
            task.end_date(),
            task.duration_days,
            task.predecessor_display(),
            if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            }
        );
    }
    if let Some(span) = schedule.graph.span() {
        println!("span: days {}..{}", span.start, span.end);
    }
    debug!("show complete");
    Ok(())
}

fn print_updates(updates: &UpdateSet) {
    if updates.is_empty() {
        println!("no changes");
        return;
    }
    for task in &updates.created {
        println!(
            "created {}: days {}..{} after: {}",
            task.id,
            task.start_date,
            task.end_date(),
            task.predecessor_display()
        );
    }
    for update in &updates.updates {
        let mut line = format!(
            "updated {}: days {}..{} ({}d)",
            update.task_id, update.new_start_date, update.new_end_date, update.duration_days
        );
        if let Some(preds) = &update.predecessors {
            let shown: Vec<String> = preds.iter().map(ToString::to_string).collect();
            line.push_str(&format!(" after: {}", if shown.is_empty() { "None".to_string() } else { shown.join(", ") }));
        }
        if let Some(lock) = update.lock {
            line.push_str(&format!(" [{lock}]"));
        }
        if update.manually_positioned {
            line.push_str(" [pinned]");
        }
        if update.dependencies_broken {
            line.push_str(" [dependencies broken]");
        }
        println!("{line}");
    }
    for id in &updates.removed {
        println!("removed {id}");
    }
}
