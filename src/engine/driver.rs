// src/engine/driver.rs

use std::collections::HashMap;
use std::fmt;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::dag::{RunSummary, TaskManager, TaskName};
use crate::errors::{Result, RundagError};
use crate::exec::{ExecOutcome, ExecutorBackend, TaskCommand};
use crate::store::OutcomeStore;

/// Runs one scheduling session to completion.
///
/// Tasks are executed one at a time; the manager only ever sees the final
/// outcome of a task, after its retries are used up.
pub struct Driver<M, E, S> {
    manager: M,
    commands: HashMap<TaskName, TaskCommand>,
    executor: E,
    store: S,
}

impl<M, E, S> fmt::Debug for Driver<M, E, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("tasks", &self.commands.len())
            .finish_non_exhaustive()
    }
}

impl<M, E, S> Driver<M, E, S>
where
    M: TaskManager,
    E: ExecutorBackend,
    S: OutcomeStore,
{
    pub fn new(
        manager: M,
        commands: HashMap<TaskName, TaskCommand>,
        executor: E,
        store: S,
    ) -> Self {
        Self {
            manager,
            commands,
            executor,
            store,
        }
    }

    /// Drain the session and return its summary.
    ///
    /// Fails with [`RundagError::SchedulerStalled`] if the manager still
    /// holds tasks but hands none out, and with
    /// [`RundagError::TaskNotFound`] if it hands out a task without a
    /// command.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!(
            order = %self.manager.planned_order().join(" -> "),
            "execution order"
        );

        self.record_definitions()?;

        while !self.manager.is_empty() {
            let Some(task) = self.manager.next() else {
                let pending = self.manager.pending();
                error!(?pending, "no runnable task while the session is not empty");
                return Err(RundagError::SchedulerStalled(pending));
            };

            let command = self
                .commands
                .get_mut(&task)
                .ok_or_else(|| RundagError::TaskNotFound(task.clone()))?;

            info!(task = %task, "starting task");
            let outcome = execute_with_retries(&mut self.executor, command).await;
            let success = outcome.is_success();

            self.store
                .record_status(&task, success, outcome.kind(), &outcome.detail())
                .with_context(|| format!("recording outcome of task '{task}'"))?;

            self.manager.report(&task, success);

            if success {
                info!(task = %task, "task completed");
            } else {
                let lost = self.manager.unreachable_from(&task);
                warn!(
                    task = %task,
                    unreachable = ?lost,
                    "task failed; downstream tasks will not run"
                );
            }
        }

        let summary = self.manager.result();
        info!(
            succeeded = ?summary.succeeded,
            failed = ?summary.failed.keys().collect::<Vec<_>>(),
            not_executed = ?summary.unreachable(),
            "session finished"
        );
        if !summary.not_started.is_empty() {
            warn!(
                tasks = ?summary.not_started,
                "some tasks never became runnable"
            );
        }

        Ok(summary)
    }

    fn record_definitions(&mut self) -> Result<()> {
        let mut names: Vec<&TaskName> = self.commands.keys().collect();
        names.sort();

        for name in names {
            let command = &self.commands[name];
            self.store
                .record_task(name, &command.spec.cmd, command.retries_left())
                .with_context(|| format!("recording definition of task '{name}'"))?;
        }
        Ok(())
    }
}

/// Run `command` until it succeeds or its retry budget is spent.
///
/// Returns the outcome of the last attempt.
pub async fn execute_with_retries<E: ExecutorBackend + ?Sized>(
    executor: &mut E,
    command: &mut TaskCommand,
) -> ExecOutcome {
    let mut attempt: u32 = 1;
    let mut outcome = executor.execute(&command.name, &command.spec).await;

    while !outcome.is_success() {
        error!(
            task = %command.name,
            attempt,
            kind = outcome.kind(),
            detail = %outcome.detail(),
            "task attempt failed"
        );

        if !command.take_retry() {
            debug!(task = %command.name, "retry budget exhausted");
            break;
        }

        attempt += 1;
        warn!(
            task = %command.name,
            attempt,
            retries_left = command.retries_left(),
            "retrying task"
        );
        outcome = executor.execute(&command.name, &command.spec).await;
    }

    outcome
}
