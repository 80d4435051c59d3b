use std::collections::{HashMap, HashSet};

use gantt_cascade::cascade::{CascadeEngine, CascadeOptions};
use gantt_cascade::edit::{CommittedEdit, EditTransaction, TaskEdit};
use gantt_cascade::errors::EditError;
use gantt_cascade::graph::{Predecessor, Task, TaskGraph};
use gantt_cascade::types::{DependencyType, TaskId};
use proptest::prelude::*;

type RawRelation = (usize, bool, i64);
type RawTask = (u32, i64, bool, Vec<RawRelation>);

// Task N may only depend on tasks 0..N-1, so every generated graph is acyclic.
fn schedule_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<Task>> {
    proptest::collection::vec(
        (
            0u32..10,
            -20i64..20,
            any::<bool>(),
            proptest::collection::vec((any::<usize>(), any::<bool>(), -5i64..5), 0..3),
        ),
        1..=max_tasks,
    )
    .prop_map(build_tasks)
}

fn build_tasks(raw: Vec<RawTask>) -> Vec<Task> {
    raw.into_iter()
        .enumerate()
        .map(|(i, (duration, start, pinned, relations))| {
            let mut task = Task::new(format!("t{i}"), duration, start);
            task.manually_positioned = pinned;
            task.sequence_order = i as i64;

            let mut seen = HashSet::new();
            if i > 0 {
                for (pred, start_to_start, lag) in relations {
                    let pred = pred % i;
                    let ty = if start_to_start {
                        DependencyType::StartToStart
                    } else {
                        DependencyType::FinishToStart
                    };
                    if seen.insert((pred, ty)) {
                        task.predecessors.push(Predecessor::new(format!("t{pred}"), ty, lag));
                    }
                }
            }
            task
        })
        .collect()
}

fn sorted(graph: TaskGraph) -> Vec<Task> {
    let mut tasks = graph.into_tasks();
    tasks.sort_by(|a, b| a.id.cmp(&b.id));
    tasks
}

type RawEdit = (u8, usize, i64);

/// A valid non-predecessor edit against `graph`: duration, start, pin,
/// delete of a task nobody depends on, or a new task hanging off an
/// existing one. `None` when the edit needs a task and there is none.
fn pick_edit(graph: &TaskGraph, step: usize, (kind, pick, value): RawEdit) -> Option<TaskEdit> {
    let tasks = graph.tasks();

    if kind == 4 {
        let mut task = Task::new(format!("n{step}"), (value.unsigned_abs() % 10) as u32, 0);
        task.sequence_order = 100 + step as i64;
        if !tasks.is_empty() {
            let pred = &tasks[pick % tasks.len()].id;
            task.predecessors.push(Predecessor::finish_to_start(pred.clone(), value % 5));
        }
        return Some(TaskEdit::AddTask { task });
    }
    if tasks.is_empty() {
        return None;
    }

    let task_id = tasks[pick % tasks.len()].id.clone();
    match kind {
        0 => Some(TaskEdit::ChangeDuration {
            task_id,
            duration_days: value.rem_euclid(15),
        }),
        1 => Some(TaskEdit::ChangeStartDate {
            task_id,
            start_date: value,
        }),
        2 => Some(TaskEdit::MarkManuallyPositioned {
            task_id,
            manually_positioned: value % 2 == 0,
        }),
        _ => tasks
            .iter()
            .cycle()
            .skip(pick % tasks.len())
            .take(tasks.len())
            .find(|t| graph.successors(&t.id).is_empty())
            .map(|t| TaskEdit::Delete {
                task_id: t.id.clone(),
            }),
    }
}

fn keeps_predecessors(
    committed: &CommittedEdit,
    expected: &HashMap<TaskId, Vec<Predecessor>>,
) -> Result<(), TestCaseError> {
    for task in committed.graph.tasks() {
        prop_assert_eq!(Some(&task.predecessors), expected.get(&task.id));
    }
    for update in &committed.updates.updates {
        prop_assert!(update.predecessors.is_none());
    }
    Ok(())
}

fn tx(floor: bool) -> EditTransaction {
    EditTransaction::new(CascadeOptions {
        predecessor_start_floor: floor,
    })
}

proptest! {
    #[test]
    fn test_recalculated_schedule_satisfies_constraints(
        tasks in schedule_strategy(12),
        floor in any::<bool>(),
    ) {
        let graph = TaskGraph::load(tasks).unwrap();
        let engine = CascadeEngine::new(CascadeOptions { predecessor_start_floor: floor });
        let settled = tx(floor).recalculate_all(&graph).unwrap().graph;

        for task in settled.tasks() {
            let required = engine.required_start(&settled, task);
            if task.manually_positioned {
                prop_assert_eq!(task.start_date, graph.get(&task.id).unwrap().start_date);
                prop_assert_eq!(task.dependencies_broken, required.is_some_and(|r| r > task.start_date));
            } else {
                prop_assert!(!task.dependencies_broken);
                if let Some(required) = required {
                    prop_assert_eq!(task.start_date, required);
                }
            }
        }

        let unpinned_violations = engine
            .violations(&settled)
            .into_iter()
            .filter(|v| !settled.get(&v.task_id).unwrap().manually_positioned)
            .count();
        prop_assert_eq!(unpinned_violations, 0);
    }

    #[test]
    fn test_recalculation_is_idempotent_and_deterministic(tasks in schedule_strategy(12)) {
        let graph = TaskGraph::load(tasks).unwrap();

        let first = tx(true).recalculate_all(&graph).unwrap();
        let second = tx(true).recalculate_all(&graph).unwrap();
        prop_assert_eq!(&first.updates, &second.updates);

        let again = tx(true).recalculate_all(&first.graph).unwrap();
        prop_assert!(again.updates.is_empty());
    }

    #[test]
    fn test_non_predecessor_edits_never_lose_predecessors(
        tasks in schedule_strategy(10),
        raw in proptest::collection::vec((0u8..5, any::<usize>(), -20i64..20), 1..8),
    ) {
        let graph = TaskGraph::load(tasks).unwrap();
        let mut expected: HashMap<TaskId, Vec<Predecessor>> = graph
            .tasks()
            .into_iter()
            .map(|t| (t.id.clone(), t.predecessors.clone()))
            .collect();

        let mut current = graph.clone();
        let mut edits = Vec::new();
        for (step, raw_edit) in raw.into_iter().enumerate() {
            let Some(edit) = pick_edit(&current, step, raw_edit) else {
                continue;
            };
            if let TaskEdit::AddTask { task } = &edit {
                expected.insert(task.id.clone(), task.predecessors.clone());
            }
            let committed = tx(true).apply(&current, edit.clone()).unwrap();
            keeps_predecessors(&committed, &expected)?;
            current = committed.graph;
            edits.push(edit);
        }

        let batched = tx(true).apply_batch(&graph, edits).unwrap();
        keeps_predecessors(&batched, &expected)?;
    }

    #[test]
    fn test_edges_closing_a_path_are_rejected(
        tasks in schedule_strategy(10),
        pick in any::<usize>(),
        depth in 1usize..4,
    ) {
        let graph = TaskGraph::load(tasks).unwrap();
        let n = graph.len();

        // Walk upstream from a task that has predecessors; the walk's end
        // can already reach the start, so an edge back must be rejected.
        let Some(downstream) = (0..n)
            .map(|offset| format!("t{}", (pick % n + offset) % n))
            .find(|id| !graph.get(id).unwrap().predecessors.is_empty())
        else {
            return Ok(());
        };
        let mut upstream = downstream.clone();
        for _ in 0..depth {
            match graph.get(&upstream).unwrap().predecessors.first() {
                Some(pred) => upstream = pred.predecessor_id.clone(),
                None => break,
            }
        }
        prop_assert!(graph.find_path(&upstream, &downstream).is_some());

        let mut predecessors = graph.get(&upstream).unwrap().predecessors.clone();
        predecessors.push(Predecessor::finish_to_start(downstream.clone(), 0));

        let result = tx(true).apply(
            &graph,
            TaskEdit::SetPredecessors { task_id: upstream.clone(), predecessors },
        );
        match result {
            Err(EditError::WouldCreateCycle { path }) => {
                prop_assert_eq!(path.first(), Some(&upstream));
                prop_assert_eq!(path.last(), Some(&upstream));
            }
            other => prop_assert!(false, "expected a cycle rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_final_state_converges_regardless_of_intermediate_edits(
        tasks in schedule_strategy(10),
        pick in any::<usize>(),
        intermediate in 0i64..15,
        last in 0i64..15,
    ) {
        let graph = TaskGraph::load(tasks).unwrap();
        let target = format!("t{}", pick % graph.len());
        let edit = |days| TaskEdit::ChangeDuration { task_id: target.clone(), duration_days: days };

        let stepwise = tx(true).apply(&graph, edit(intermediate)).unwrap().graph;
        let stepwise = tx(true).apply(&stepwise, edit(last)).unwrap().graph;
        let direct = tx(true).apply(&graph, edit(last)).unwrap().graph;

        prop_assert_eq!(sorted(stepwise), sorted(direct));
    }
}
