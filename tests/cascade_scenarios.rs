use gantt_cascade::cascade::{CascadeEngine, CascadeOptions};
use gantt_cascade::edit::{EditTransaction, TaskEdit};
use gantt_cascade::errors::EditError;
use gantt_cascade::graph::{Predecessor, TaskGraph};
use gantt_cascade_test_utils::{ScheduleBuilder, TaskBuilder, init_tracing};

fn tx() -> EditTransaction {
    EditTransaction::new(CascadeOptions::default())
}

/// A (1 day, day 0) -> B (FS +3, 5 days), with B already settled on day 4.
fn settled_pair() -> TaskGraph {
    ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("B").duration(5).start(4).after_fs("A", 3))
        .build_graph()
}

#[test]
fn test_finish_to_start_with_lag_places_successor() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("B").duration(5).after_fs("A", 3))
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();
    let b = committed.graph.get("B").unwrap();

    assert_eq!(b.start_date, 4);
    assert_eq!(b.end_date(), 9);
    assert_eq!(committed.updates.updated_ids(), vec!["B"]);
}

#[test]
fn test_duration_change_cascades_to_successor() {
    init_tracing();
    let graph = settled_pair();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeDuration {
                task_id: "A".into(),
                duration_days: 3,
            },
        )
        .unwrap();

    assert_eq!(committed.updates.updated_ids(), vec!["A", "B"]);
    let b = committed.updates.get("B").unwrap();
    assert_eq!(b.new_start_date, 6);
    assert_eq!(b.new_end_date, 11);
    assert_eq!(b.predecessors, None);

    let b = committed.graph.get("B").unwrap();
    assert_eq!(b.predecessors, vec![Predecessor::finish_to_start("A", 3)]);
}

#[test]
fn test_reverse_edge_is_rejected_as_cycle() {
    init_tracing();
    let graph = settled_pair();

    let err = tx()
        .apply(
            &graph,
            TaskEdit::SetPredecessors {
                task_id: "A".into(),
                predecessors: vec![Predecessor::finish_to_start("B", 0)],
            },
        )
        .unwrap_err();

    assert_eq!(
        err,
        EditError::WouldCreateCycle {
            path: vec!["A".into(), "B".into(), "A".into()]
        }
    );
    assert!(graph.get("A").unwrap().predecessors.is_empty());
}

#[test]
fn test_pinned_task_is_flagged_not_moved() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("C").duration(2).start(2).after_fs("A", 3).pinned())
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();
    let c = committed.graph.get("C").unwrap();

    assert_eq!(c.start_date, 2);
    assert!(c.manually_positioned);
    assert!(c.dependencies_broken);

    let update = committed.updates.get("C").unwrap();
    assert_eq!(update.new_start_date, 2);
    assert!(update.dependencies_broken);
}

#[test]
fn test_empty_predecessor_list_is_respected() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(2).start(0))
        .task(TaskBuilder::new("B").duration(3).start(0))
        .task(TaskBuilder::new("D").duration(1).start(3).after("A").after("B"))
        .build_graph();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::SetPredecessors {
                task_id: "D".into(),
                predecessors: vec![],
            },
        )
        .unwrap();

    assert!(committed.graph.get("D").unwrap().predecessors.is_empty());
    assert_eq!(committed.updates.get("D").unwrap().predecessors, Some(vec![]));
    // Without predecessors the task keeps its current date.
    assert_eq!(committed.graph.get("D").unwrap().start_date, 3);
}

#[test]
fn test_non_predecessor_edit_keeps_predecessors() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(2).start(0))
        .task(TaskBuilder::new("B").duration(3).start(0))
        .task(TaskBuilder::new("D").duration(1).start(3).after("A").after("B"))
        .build_graph();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeDuration {
                task_id: "D".into(),
                duration_days: 4,
            },
        )
        .unwrap();

    assert_eq!(committed.graph.get("D").unwrap().predecessors.len(), 2);
    assert_eq!(committed.updates.get("D").unwrap().predecessors, None);
}

#[test]
fn test_latest_bound_wins_across_predecessors() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(2).start(0))
        .task(TaskBuilder::new("B").duration(5).start(0))
        .task(TaskBuilder::new("C").duration(1).after("A").after("B"))
        .build_graph();

    let engine = CascadeEngine::new(CascadeOptions::default());
    let c = graph.get("C").unwrap();
    assert_eq!(engine.required_start(&graph, c), Some(5));

    let committed = tx().recalculate_all(&graph).unwrap();
    assert_eq!(committed.graph.get("C").unwrap().start_date, 5);
}

#[test]
fn test_finish_and_start_relations_to_same_predecessor() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(2).start(0))
        .task(TaskBuilder::new("B").duration(1).after_fs("A", 0).after_ss("A", 4))
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();
    assert_eq!(committed.graph.get("B").unwrap().start_date, 4);
}

#[test]
fn test_negative_lag_is_floored_at_predecessor_start() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(5).start(10))
        .task(TaskBuilder::new("B").duration(1).after_fs("A", -8))
        .build_graph();

    let floored = tx().recalculate_all(&graph).unwrap();
    assert_eq!(floored.graph.get("B").unwrap().start_date, 10);

    let unfloored = EditTransaction::new(CascadeOptions {
        predecessor_start_floor: false,
    })
    .recalculate_all(&graph)
    .unwrap();
    assert_eq!(unfloored.graph.get("B").unwrap().start_date, 7);
}

#[test]
fn test_start_to_start_negative_lag_is_not_floored() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(5).start(10))
        .task(TaskBuilder::new("B").duration(1).after_ss("A", -3))
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();
    assert_eq!(committed.graph.get("B").unwrap().start_date, 7);
}

#[test]
fn test_milestone_successor_starts_at_milestone() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("handover").duration(0).start(5))
        .task(TaskBuilder::new("cleanup").duration(2).after("handover"))
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();
    assert_eq!(committed.graph.get("cleanup").unwrap().start_date, 5);
}

#[test]
fn test_pinned_task_still_propagates_to_successors() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("P").duration(2).start(10).after("A").pinned())
        .task(TaskBuilder::new("Z").duration(1).start(0).after("P"))
        .build_graph();

    let committed = tx().recalculate_all(&graph).unwrap();

    let p = committed.graph.get("P").unwrap();
    assert_eq!(p.start_date, 10);
    assert!(!p.dependencies_broken);
    assert_eq!(committed.graph.get("Z").unwrap().start_date, 12);
    assert_eq!(committed.updates.updated_ids(), vec!["Z"]);
}

#[test]
fn test_moving_pinned_task_clears_broken_flag() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("C").duration(2).start(2).after_fs("A", 3).pinned().broken())
        .build_graph();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeStartDate {
                task_id: "C".into(),
                start_date: 6,
            },
        )
        .unwrap();

    let c = committed.updates.get("C").unwrap();
    assert_eq!(c.new_start_date, 6);
    assert!(c.manually_positioned);
    assert!(!c.dependencies_broken);
}

#[test]
fn test_start_change_pins_task() {
    init_tracing();
    let graph = settled_pair();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeStartDate {
                task_id: "B".into(),
                start_date: 1,
            },
        )
        .unwrap();

    let b = committed.graph.get("B").unwrap();
    assert_eq!(b.start_date, 1);
    assert!(b.manually_positioned);
    assert!(b.dependencies_broken);
}

#[test]
fn test_unpin_lets_cascade_relocate_task() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("C").duration(2).start(2).after_fs("A", 3).pinned().broken())
        .build_graph();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::MarkManuallyPositioned {
                task_id: "C".into(),
                manually_positioned: false,
            },
        )
        .unwrap();

    let c = committed.graph.get("C").unwrap();
    assert_eq!(c.start_date, 4);
    assert!(!c.manually_positioned);
    assert!(!c.dependencies_broken);
}

#[test]
fn test_unrelated_tasks_are_not_touched() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("B").duration(5).start(4).after_fs("A", 3))
        .task(TaskBuilder::new("X").duration(1).start(0))
        .task(TaskBuilder::new("Y").duration(1).start(0).after("X"))
        .build_graph();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeDuration {
                task_id: "A".into(),
                duration_days: 2,
            },
        )
        .unwrap();

    assert_eq!(committed.updates.updated_ids(), vec!["A", "B"]);
    // Y is stale relative to X, but it is outside the edited subgraph.
    assert_eq!(committed.graph.get("Y").unwrap().start_date, 0);
}

#[test]
fn test_unchanged_value_produces_empty_update_set() {
    init_tracing();
    let graph = settled_pair();

    let committed = tx()
        .apply(
            &graph,
            TaskEdit::ChangeDuration {
                task_id: "A".into(),
                duration_days: 1,
            },
        )
        .unwrap();

    assert!(committed.updates.is_empty());
    assert!(tx().recalculate_all(&graph).unwrap().updates.is_empty());
}

#[test]
fn test_violations_report_each_broken_edge() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("B").duration(3).start(0))
        .task(TaskBuilder::new("C").duration(2).start(2).after_fs("A", 3).after_ss("B", 1).pinned())
        .build_graph();

    let violations = CascadeEngine::new(CascadeOptions::default()).violations(&graph);

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].task_id, "C");
    assert_eq!(violations[0].predecessor_id, "A");
    assert_eq!(violations[0].required_start, 4);
    assert_eq!(violations[0].actual_start, 2);
}

#[test]
fn test_pure_cascade_leaves_input_untouched() {
    init_tracing();
    let graph = ScheduleBuilder::new()
        .task(TaskBuilder::new("A").duration(1).start(0))
        .task(TaskBuilder::new("B").duration(5).after_fs("A", 3))
        .build_graph();

    let engine = CascadeEngine::new(CascadeOptions::default());
    let (next, updates) = engine.cascade(&graph, &["A".to_string()]).unwrap();

    assert_eq!(graph.get("B").unwrap().start_date, 0);
    assert_eq!(next.get("B").unwrap().start_date, 4);
    assert_eq!(updates.updated_ids(), vec!["B"]);
}
