// tests/scheduler_behaviour.rs

use std::collections::{BTreeSet, HashSet};
use std::error::Error;

use rundag::dag::{QueueTaskManager, Scheduler, TaskManager, TaskState};
use rundag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

const PIPELINE: [(&str, &str); 11] = [
    ("A", "B"),
    ("B", "C"),
    ("B", "D"),
    ("C", "E"),
    ("D", "G"),
    ("D", "F"),
    ("F", "G"),
    ("J", "E"),
    ("E", "G"),
    ("E", "H"),
    ("G", "I"),
];

/// Drive a session sequentially, failing the tasks in `failing`.
fn drain<M: TaskManager>(manager: &mut M, failing: &HashSet<&str>) -> Vec<String> {
    let mut dispatched = Vec::new();
    while !manager.is_empty() {
        let task = manager
            .next()
            .expect("sequential session should never stall on a DAG");
        manager.report(&task, !failing.contains(task.as_str()));
        dispatched.push(task);
    }
    dispatched
}

fn set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn all_success_run_respects_every_edge() -> TestResult {
    init_tracing();

    let mut scheduler = Scheduler::new(PIPELINE);
    let dispatched = drain(&mut scheduler, &HashSet::new());

    assert_eq!(dispatched.len(), 10);
    let pos = |n: &str| dispatched.iter().position(|t| t == n);
    for (u, d) in PIPELINE {
        let upstream = pos(u).ok_or("missing upstream")?;
        let downstream = pos(d).ok_or("missing downstream")?;
        assert!(upstream < downstream, "{u} ran after {d}: {dispatched:?}");
    }

    let summary = scheduler.result();
    assert!(summary.all_succeeded());
    assert_eq!(summary.succeeded.len(), 10);
    Ok(())
}

#[test]
fn failure_in_the_middle_cuts_off_downstream() -> TestResult {
    init_tracing();

    let mut scheduler = Scheduler::new(PIPELINE);
    let dispatched = drain(&mut scheduler, &HashSet::from(["D"]));

    let summary = scheduler.result();
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed["D"], set(&["F", "G", "I"]));
    assert_eq!(summary.succeeded, set(&["A", "B", "C", "E", "H", "J"]));

    for lost in ["F", "G", "I"] {
        assert!(!dispatched.contains(&lost.to_string()), "{lost} dispatched");
        assert_eq!(scheduler.state_of(lost), Some(TaskState::Unreachable));
    }
    Ok(())
}

#[test]
fn independent_branches_keep_running_after_failure() -> TestResult {
    init_tracing();

    let mut scheduler = Scheduler::new([("A", "B"), ("C", "D")]);
    let dispatched = drain(&mut scheduler, &HashSet::from(["A"]));

    assert!(dispatched.contains(&"C".to_string()));
    assert!(dispatched.contains(&"D".to_string()));
    assert_eq!(scheduler.result().unreachable(), set(&["B"]));
    Ok(())
}

#[test]
fn queue_manager_runs_everything_in_given_order() {
    let mut manager = QueueTaskManager::new(["A", "B", "C"]);
    let dispatched = drain(&mut manager, &HashSet::from(["B"]));

    assert_eq!(dispatched, ["A", "B", "C"]);
    let summary = manager.result();
    assert_eq!(summary.succeeded, set(&["A", "C"]));
    assert!(summary.failed.contains_key("B"));
}

#[test]
fn planned_order_lists_isolated_tasks_last() {
    let scheduler = Scheduler::with_tasks(["docs", "A", "B"], [("A", "B")]);
    assert_eq!(scheduler.planned_order(), ["A", "B", "docs"]);
}
