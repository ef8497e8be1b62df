// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The driver talks to an `ExecutorBackend` instead of spawning processes
//! itself, so tests can swap in a scripted executor while production uses
//! [`ProcessExecutor`].

use std::future::Future;
use std::pin::Pin;

use tracing::info;

use crate::exec::command::{CommandSpec, run_command};
use crate::exec::outcome::ExecOutcome;

pub type ExecFuture<'a> = Pin<Box<dyn Future<Output = ExecOutcome> + Send + 'a>>;

/// Trait abstracting how a single task attempt is executed.
pub trait ExecutorBackend: Send {
    /// Run one attempt of `task` and classify how it ended.
    fn execute<'a>(&'a mut self, task: &'a str, spec: &'a CommandSpec) -> ExecFuture<'a>;
}

/// Runs task commands as OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ExecutorBackend for ProcessExecutor {
    fn execute<'a>(&'a mut self, task: &'a str, spec: &'a CommandSpec) -> ExecFuture<'a> {
        Box::pin(async move {
            info!(task = %task, cmd = %spec.cmd, "starting task process");
            let outcome = run_command(spec).await;
            info!(
                task = %task,
                outcome = outcome.kind(),
                "task process finished"
            );
            outcome
        })
    }
}
