// src/dag/task_manager.rs

//! The contract the driver loop talks to.
//!
//! [`crate::dag::Scheduler`] is the graph-backed production implementation;
//! [`QueueTaskManager`] hands tasks out in a fixed order and is handy when a
//! test only cares about the driver and executor side.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::dag::TaskName;

/// Something that hands out task names and accepts their outcomes.
pub trait TaskManager {
    /// `true` once there is nothing left to hand out.
    fn is_empty(&self) -> bool;

    /// Next runnable task, or `None` if nothing can run right now.
    fn next(&mut self) -> Option<TaskName>;

    /// Record the final outcome of a task previously returned by `next`.
    fn report(&mut self, task: &str, success: bool);

    /// Snapshot of the outcomes recorded so far.
    fn result(&self) -> RunSummary;

    /// Tasks that became unreachable because `task` failed.
    fn unreachable_from(&self, _task: &str) -> BTreeSet<TaskName> {
        BTreeSet::new()
    }

    /// Tasks that are still waiting to be handed out.
    fn pending(&self) -> Vec<TaskName>;

    /// Expected hand-out order, for logging before a session starts.
    fn planned_order(&self) -> Vec<TaskName> {
        self.pending()
    }
}

/// Outcome of a scheduling session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: BTreeSet<TaskName>,
    /// Failed task -> tasks that never ran because of it.
    pub failed: BTreeMap<TaskName, BTreeSet<TaskName>>,
    /// Tasks not handed out yet. After a finished session these are the
    /// ones that never became runnable, e.g. because of a cycle.
    pub not_started: BTreeSet<TaskName>,
}

impl RunSummary {
    /// Union of all tasks made unreachable by failures.
    pub fn unreachable(&self) -> BTreeSet<TaskName> {
        self.failed.values().flatten().cloned().collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.not_started.is_empty()
    }
}

/// In-memory manager that hands tasks out in insertion order.
///
/// There is no dependency tracking: a failure is recorded but affects no
/// other task.
#[derive(Debug, Clone, Default)]
pub struct QueueTaskManager {
    order: VecDeque<TaskName>,
    success_tasks: Vec<TaskName>,
    failed_tasks: Vec<TaskName>,
}

impl QueueTaskManager {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
            success_tasks: Vec::new(),
            failed_tasks: Vec::new(),
        }
    }
}

impl TaskManager for QueueTaskManager {
    fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn next(&mut self) -> Option<TaskName> {
        self.order.pop_front()
    }

    fn report(&mut self, task: &str, success: bool) {
        debug!(task = %task, success, "queue manager: recording outcome");
        if success {
            self.success_tasks.push(task.to_string());
        } else {
            self.failed_tasks.push(task.to_string());
        }
    }

    fn result(&self) -> RunSummary {
        RunSummary {
            succeeded: self.success_tasks.iter().cloned().collect(),
            failed: self
                .failed_tasks
                .iter()
                .map(|t| (t.clone(), BTreeSet::new()))
                .collect(),
            not_started: BTreeSet::new(),
        }
    }

    fn pending(&self) -> Vec<TaskName> {
        self.order.iter().cloned().collect()
    }
}
