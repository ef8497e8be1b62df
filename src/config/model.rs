// src/config/model.rs

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::dag::TaskName;
use crate::exec::{CommandSpec, TaskCommand};
use crate::types::StoreMode;

/// Retry budget for tasks that set neither `retry` nor `[default].retry`.
pub const DEFAULT_RETRY: u32 = 3;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// order = [["lint", "test"]]
///
/// [config]
/// project_name = "nightly"
/// store = "text"
///
/// [default]
/// retry = 1
/// timeout = "30s"
///
/// [task.build]
/// cmd = "make"
///
/// [task.test]
/// cmd = "make test"
/// after = ["build"]
/// ```
///
/// `order` is a top-level key, so it has to come before the first table.
/// All sections except `[task.<name>]` are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub default: DefaultSection,

    /// Keys are the task names.
    #[serde(default)]
    pub task: BTreeMap<String, RawTaskConfig>,

    /// Extra `(upstream, downstream)` precedence pairs.
    #[serde(default)]
    pub order: Vec<(String, String)>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Names the outcome file when `store = "text"`.
    #[serde(default)]
    pub project_name: Option<String>,

    #[serde(default)]
    pub store: StoreMode,

    /// Directory that holds `<project_name>.txt`. Defaults to `.`.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Append logs to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

/// `[default]` section: fallbacks for every task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DefaultSection {
    #[serde(default)]
    pub retry: Option<u32>,

    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub use_shell: Option<bool>,

    #[serde(default)]
    pub fail_on_stderr: Option<bool>,
}

/// `[task.<name>]` section as written in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTaskConfig {
    pub cmd: String,

    /// This task waits for every task listed here.
    #[serde(default)]
    pub after: Vec<String>,

    #[serde(default)]
    pub retry: Option<u32>,

    /// Duration string such as `"5s"`.
    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub use_shell: Option<bool>,

    #[serde(default)]
    pub fail_on_stderr: Option<bool>,
}

impl RawTaskConfig {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            after: Vec::new(),
            retry: None,
            timeout: None,
            use_shell: None,
            fail_on_stderr: None,
        }
    }
}

/// A task with defaults applied and its timeout parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    pub cmd: String,
    pub after: Vec<TaskName>,
    pub retry: u32,
    pub timeout: Option<Duration>,
    pub use_shell: bool,
    pub fail_on_stderr: bool,
}

impl TaskConfig {
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec {
            cmd: self.cmd.clone(),
            timeout: self.timeout,
            use_shell: self.use_shell,
            fail_on_stderr: self.fail_on_stderr,
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so the task references
/// are known to resolve and the precedence graph is acyclic.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub task: BTreeMap<TaskName, TaskConfig>,
    order: Vec<(TaskName, TaskName)>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        task: BTreeMap<TaskName, TaskConfig>,
        order: Vec<(TaskName, TaskName)>,
    ) -> Self {
        Self {
            config,
            task,
            order,
        }
    }

    /// Every precedence pair: `after` lists first (tasks by name), then the
    /// top-level `order` pairs. Duplicates are kept.
    pub fn edges(&self) -> Vec<(TaskName, TaskName)> {
        let after = self.task.iter().flat_map(|(name, task)| {
            task.after
                .iter()
                .map(move |dep| (dep.clone(), name.clone()))
        });
        after.chain(self.order.iter().cloned()).collect()
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.task.keys().map(String::as_str)
    }

    /// Executable commands keyed by task name, each with a fresh retry
    /// budget.
    pub fn task_commands(&self) -> HashMap<TaskName, TaskCommand> {
        self.task
            .iter()
            .map(|(name, task)| {
                (
                    name.clone(),
                    TaskCommand::new(name.clone(), task.command_spec(), task.retry),
                )
            })
            .collect()
    }

    pub fn order(&self) -> &[(TaskName, TaskName)] {
        &self.order
    }

    pub fn log_file(&self) -> Option<&Path> {
        self.config.log_file.as_deref()
    }
}
