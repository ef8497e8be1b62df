// src/exec/outcome.rs

//! Classified result of running one task command.

use std::fmt;
use std::time::Duration;

/// How a single attempt of a task command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// Exited cleanly; captured stdout on one line.
    Success { stdout: String },
    /// Non-zero exit, or stderr output when stderr counts as failure.
    ProgramError {
        stderr: String,
        exit_code: Option<i32>,
    },
    /// Killed after exceeding its timeout.
    Timeout { after: Duration },
    /// Could not be spawned or waited on.
    UnknownError { message: String },
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Success { .. })
    }

    /// Stable classification label used in logs and the outcome store.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecOutcome::Success { .. } => "success",
            ExecOutcome::ProgramError { .. } => "program error",
            ExecOutcome::Timeout { .. } => "timeout",
            ExecOutcome::UnknownError { .. } => "unknown error",
        }
    }

    /// Captured text that best describes the attempt.
    pub fn detail(&self) -> String {
        match self {
            ExecOutcome::Success { stdout } => stdout.clone(),
            ExecOutcome::ProgramError { stderr, .. } => stderr.clone(),
            ExecOutcome::Timeout { after } => format!("no exit after {after:?}"),
            ExecOutcome::UnknownError { message } => message.clone(),
        }
    }
}

impl fmt::Display for ExecOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecOutcome::ProgramError {
                exit_code: Some(code),
                stderr,
            } => write!(f, "{} (exit code {code}): {stderr}", self.kind()),
            _ => write!(f, "{}: {}", self.kind(), self.detail()),
        }
    }
}
