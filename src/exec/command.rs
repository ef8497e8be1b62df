// src/exec/command.rs

//! One-shot process execution for task commands.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::dag::TaskName;
use crate::exec::outcome::ExecOutcome;

/// How to run a task's command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub cmd: String,
    /// Kill the process and report a timeout after this long.
    pub timeout: Option<Duration>,
    /// Run through `sh -c` (`cmd /C` on Windows) instead of splitting on
    /// whitespace.
    pub use_shell: bool,
    /// Treat any stderr output as a program error, even on exit code 0.
    pub fail_on_stderr: bool,
}

impl CommandSpec {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            timeout: None,
            use_shell: true,
            fail_on_stderr: true,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_shell(mut self, use_shell: bool) -> Self {
        self.use_shell = use_shell;
        self
    }

    pub fn with_fail_on_stderr(mut self, fail_on_stderr: bool) -> Self {
        self.fail_on_stderr = fail_on_stderr;
        self
    }
}

/// Run `spec` once and classify the result.
///
/// Never fails: spawn and wait errors become [`ExecOutcome::UnknownError`].
pub async fn run_command(spec: &CommandSpec) -> ExecOutcome {
    match run_command_inner(spec).await {
        Ok(outcome) => outcome,
        Err(err) => {
            let message = format!("{err:#}");
            warn!(cmd = %spec.cmd, error = %message, "command could not be run");
            ExecOutcome::UnknownError { message }
        }
    }
}

async fn run_command_inner(spec: &CommandSpec) -> Result<ExecOutcome> {
    let mut cmd = build_command(spec)?;
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .with_context(|| format!("spawning process for '{}'", spec.cmd))?;

    let wait = child.wait_with_output();
    let output = match spec.timeout {
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(res) => res,
            Err(_) => {
                // Dropping the wait future drops the child, which kills it.
                debug!(cmd = %spec.cmd, ?limit, "command timed out");
                return Ok(ExecOutcome::Timeout { after: limit });
            }
        },
        None => wait.await,
    }
    .with_context(|| format!("waiting for process of '{}'", spec.cmd))?;

    let stdout = one_line(&output.stdout);
    let stderr = one_line(&output.stderr);
    let exit_code = output.status.code();

    debug!(
        cmd = %spec.cmd,
        exit_code = ?exit_code,
        stderr_bytes = output.stderr.len(),
        "command exited"
    );

    if !output.status.success() || (spec.fail_on_stderr && !stderr.is_empty()) {
        return Ok(ExecOutcome::ProgramError { stderr, exit_code });
    }

    Ok(ExecOutcome::Success { stdout })
}

fn build_command(spec: &CommandSpec) -> Result<Command> {
    if spec.use_shell {
        let cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&spec.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&spec.cmd);
            c
        };
        return Ok(cmd);
    }

    let mut parts = spec.cmd.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("empty command line");
    };
    let mut cmd = Command::new(program);
    cmd.args(parts);
    Ok(cmd)
}

/// Collapse captured output onto a single line.
fn one_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A task's command together with its remaining retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCommand {
    pub name: TaskName,
    pub spec: CommandSpec,
    retries_left: u32,
}

impl TaskCommand {
    pub fn new(name: impl Into<TaskName>, spec: CommandSpec, retry: u32) -> Self {
        Self {
            name: name.into(),
            spec,
            retries_left: retry,
        }
    }

    pub fn retries_left(&self) -> u32 {
        self.retries_left
    }

    /// Consume one retry; `false` once the budget is exhausted.
    pub fn take_retry(&mut self) -> bool {
        if self.retries_left == 0 {
            return false;
        }
        self.retries_left -= 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_is_collapsed_to_one_line() {
        assert_eq!(one_line(b"a\nb\r\n\nc\n"), "a b c");
        assert_eq!(one_line(b"\n\n"), "");
    }

    #[test]
    fn retry_budget_counts_down_to_zero() {
        let mut task = TaskCommand::new("A", CommandSpec::new("true"), 2);

        assert!(task.take_retry());
        assert!(task.take_retry());
        assert!(!task.take_retry());
        assert_eq!(task.retries_left(), 0);
    }

    #[test]
    fn empty_argv_is_rejected() {
        let spec = CommandSpec::new("   ").with_shell(false);
        assert!(build_command(&spec).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_program_is_unknown_error() {
        let spec = CommandSpec::new("definitely-not-a-real-binary-rundag").with_shell(false);
        let outcome = run_command(&spec).await;
        assert_eq!(outcome.kind(), "unknown error");
    }
}
