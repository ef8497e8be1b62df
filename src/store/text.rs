// src/store/text.rs

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use crate::store::OutcomeStore;

/// Append-only text file with one record per line.
///
/// ```text
/// task_name : A, command: echo A, retry: 3
/// task_name : A, status : success, message: success, stdout : A
/// ```
#[derive(Debug)]
pub struct TextStore {
    path: PathBuf,
    file: File,
}

impl TextStore {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening outcome store {}", path.display()))?;
        debug!(path = %path.display(), "opened text outcome store");
        Ok(Self { path, file })
    }

    fn append(&mut self, line: &str) -> Result<()> {
        writeln!(self.file, "{line}")
            .with_context(|| format!("writing to outcome store {}", self.path.display()))
    }
}

impl OutcomeStore for TextStore {
    fn record_task(&mut self, task: &str, cmd: &str, retry: u32) -> Result<()> {
        self.append(&format!(
            "task_name : {task}, command: {cmd}, retry: {retry}"
        ))
    }

    fn record_status(
        &mut self,
        task: &str,
        success: bool,
        message: &str,
        output: &str,
    ) -> Result<()> {
        let status = if success { "success" } else { "fail" };
        self.append(&format!(
            "task_name : {task}, status : {status}, message: {message}, stdout : {output}"
        ))
    }
}
