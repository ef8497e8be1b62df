// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs one attempt of a task command and classifies it.
//! - [`outcome`] defines the classification.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   [`ProcessExecutor`].
//! - [`duration`] parses `30s`-style timeouts from configuration.

pub mod backend;
pub mod command;
pub mod duration;
pub mod outcome;

pub use backend::{ExecFuture, ExecutorBackend, ProcessExecutor};
pub use command::{CommandSpec, TaskCommand, run_command};
pub use duration::parse_duration;
pub use outcome::ExecOutcome;
