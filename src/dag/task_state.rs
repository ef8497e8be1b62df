// src/dag/task_state.rs

//! Per-task lifecycle within one scheduling session.

use std::fmt;

/// Lifecycle of a single task.
///
/// ```text
/// Pending --next()--> Dispatched --report(true)--> Done
///                                 \-report(false)-> Failed
/// Pending --(upstream failed)--> Unreachable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for its dependencies, or for `next()` to hand it out.
    Pending,
    /// Handed out by `next()` and not yet reported.
    Dispatched,
    /// Reported as successful.
    Done,
    /// Reported as failed.
    Failed,
    /// Never run because an upstream task failed.
    Unreachable,
}

impl TaskState {
    /// Whether the task has reached a final state for this session.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Done | TaskState::Failed | TaskState::Unreachable
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TaskState::Pending => "pending",
            TaskState::Dispatched => "dispatched",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
            TaskState::Unreachable => "unreachable",
        };
        f.write_str(label)
    }
}
