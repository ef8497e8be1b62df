// src/store/mod.rs

//! Persistence of task definitions and final outcomes.
//!
//! - [`NullStore`] discards everything (`store = "none"`).
//! - [`text::TextStore`] appends one line per record to a text file.
//! - [`MemoryStore`] keeps records in memory for tests and embedding.

pub mod text;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Result, anyhow};

use crate::config::ConfigFile;
use crate::types::StoreMode;

pub use text::TextStore;

/// Sink for task records written by the driver.
pub trait OutcomeStore: Send {
    /// Record a task definition before it runs.
    fn record_task(&mut self, task: &str, cmd: &str, retry: u32) -> Result<()>;

    /// Record the final outcome of a task.
    fn record_status(
        &mut self,
        task: &str,
        success: bool,
        message: &str,
        output: &str,
    ) -> Result<()>;
}

impl<T: OutcomeStore + ?Sized> OutcomeStore for Box<T> {
    fn record_task(&mut self, task: &str, cmd: &str, retry: u32) -> Result<()> {
        (**self).record_task(task, cmd, retry)
    }

    fn record_status(
        &mut self,
        task: &str,
        success: bool,
        message: &str,
        output: &str,
    ) -> Result<()> {
        (**self).record_status(task, success, message, output)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore;

impl OutcomeStore for NullStore {
    fn record_task(&mut self, _task: &str, _cmd: &str, _retry: u32) -> Result<()> {
        Ok(())
    }

    fn record_status(
        &mut self,
        _task: &str,
        _success: bool,
        _message: &str,
        _output: &str,
    ) -> Result<()> {
        Ok(())
    }
}

/// One record written to an [`OutcomeStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreRecord {
    Task {
        task: String,
        cmd: String,
        retry: u32,
    },
    Status {
        task: String,
        success: bool,
        message: String,
        output: String,
    },
}

/// In-memory store. Clones share the same record list.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<StoreRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<StoreRecord> {
        self.lock().clone()
    }

    fn push(&self, record: StoreRecord) -> Result<()> {
        self.lock().push(record);
        Ok(())
    }

    // A panicking writer can only leave a fully pushed or untouched list.
    fn lock(&self) -> MutexGuard<'_, Vec<StoreRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutcomeStore for MemoryStore {
    fn record_task(&mut self, task: &str, cmd: &str, retry: u32) -> Result<()> {
        self.push(StoreRecord::Task {
            task: task.to_string(),
            cmd: cmd.to_string(),
            retry,
        })
    }

    fn record_status(
        &mut self,
        task: &str,
        success: bool,
        message: &str,
        output: &str,
    ) -> Result<()> {
        self.push(StoreRecord::Status {
            task: task.to_string(),
            success,
            message: message.to_string(),
            output: output.to_string(),
        })
    }
}

/// Open the store selected by `[config].store`.
pub fn open_store(cfg: &ConfigFile) -> Result<Box<dyn OutcomeStore>> {
    match cfg.config.store {
        StoreMode::None => Ok(Box::new(NullStore)),
        StoreMode::Text => {
            let project = cfg
                .config
                .project_name
                .as_deref()
                .ok_or_else(|| anyhow!("store = \"text\" requires [config].project_name"))?;
            let dir = cfg
                .config
                .data_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("."));
            Ok(Box::new(TextStore::open(dir.join(format!("{project}.txt")))?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_records() {
        let store = MemoryStore::new();
        let mut writer = store.clone();

        writer.record_task("A", "echo A", 3).unwrap();
        writer.record_status("A", true, "success", "A").unwrap();

        assert_eq!(
            store.records(),
            vec![
                StoreRecord::Task {
                    task: "A".into(),
                    cmd: "echo A".into(),
                    retry: 3,
                },
                StoreRecord::Status {
                    task: "A".into(),
                    success: true,
                    message: "success".into(),
                    output: "A".into(),
                },
            ]
        );
    }

    #[test]
    fn poisoned_lock_keeps_reads_and_writes_consistent() {
        let store = MemoryStore::new();
        let shared = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.records.lock().unwrap();
            panic!("writer died while holding the record lock");
        })
        .join();
        assert!(store.records.is_poisoned());

        let mut writer = store.clone();
        writer.record_task("A", "echo A", 0).unwrap();
        writer.record_status("A", true, "success", "A").unwrap();

        assert_eq!(store.records().len(), 2);
    }

    #[test]
    fn boxed_store_forwards() {
        let store = MemoryStore::new();
        let mut boxed: Box<dyn OutcomeStore> = Box::new(store.clone());
        boxed.record_task("B", "false", 0).unwrap();
        assert_eq!(store.records().len(), 1);
    }
}
