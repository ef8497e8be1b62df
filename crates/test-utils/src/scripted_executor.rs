use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use rundag::exec::{CommandSpec, ExecFuture, ExecOutcome, ExecutorBackend};

/// A fake executor that:
/// - records every attempt it is asked to run, in order
/// - plays back scripted outcomes per task
/// - succeeds with the task name as stdout once a script runs out
///
/// Clones share the attempt log, so a test can keep one handle while the
/// driver owns another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExecutor {
    executed: Arc<Mutex<Vec<String>>>,
    scripts: HashMap<String, VecDeque<ExecOutcome>>,
    always_fail: HashSet<String>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue outcomes for successive attempts of `task`.
    pub fn with_outcomes(
        mut self,
        task: &str,
        outcomes: impl IntoIterator<Item = ExecOutcome>,
    ) -> Self {
        self.scripts
            .entry(task.to_string())
            .or_default()
            .extend(outcomes);
        self
    }

    /// Every attempt of `task` ends in a program error.
    pub fn failing(mut self, task: &str) -> Self {
        self.always_fail.insert(task.to_string());
        self
    }

    /// Attempts made so far, one entry per attempt.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    pub fn attempts_of(&self, task: &str) -> usize {
        self.executed().iter().filter(|t| *t == task).count()
    }

    fn next_outcome(&mut self, task: &str) -> ExecOutcome {
        if self.always_fail.contains(task) {
            return program_error(task);
        }
        self.scripts
            .get_mut(task)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| ExecOutcome::Success {
                stdout: task.to_string(),
            })
    }
}

impl ExecutorBackend for ScriptedExecutor {
    fn execute<'a>(&'a mut self, task: &'a str, _spec: &'a CommandSpec) -> ExecFuture<'a> {
        self.executed.lock().unwrap().push(task.to_string());
        let outcome = self.next_outcome(task);
        Box::pin(async move { outcome })
    }
}

/// Program error with a recognisable stderr.
pub fn program_error(task: &str) -> ExecOutcome {
    ExecOutcome::ProgramError {
        stderr: format!("{task} failed"),
        exit_code: Some(1),
    }
}
