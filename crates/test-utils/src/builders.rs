use std::path::Path;

use rundag::config::{ConfigFile, RawConfigFile, RawTaskConfig};
use rundag::errors::Result;
use rundag::types::StoreMode;

/// Builder for `ConfigFile` to simplify test setup.
#[derive(Debug, Default)]
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, name: &str, task: RawTaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    /// Add a top-level `order` pair.
    pub fn with_order(mut self, upstream: &str, downstream: &str) -> Self {
        self.config
            .order
            .push((upstream.to_string(), downstream.to_string()));
        self
    }

    pub fn with_default_retry(mut self, retry: u32) -> Self {
        self.config.default.retry = Some(retry);
        self
    }

    pub fn with_default_timeout(mut self, timeout: &str) -> Self {
        self.config.default.timeout = Some(timeout.to_string());
        self
    }

    /// Persist outcomes to `<dir>/<project>.txt`.
    pub fn with_text_store(mut self, project: &str, dir: &Path) -> Self {
        self.config.config.store = StoreMode::Text;
        self.config.config.project_name = Some(project.to_string());
        self.config.config.data_path = Some(dir.to_path_buf());
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

/// Builder for `RawTaskConfig`.
#[derive(Debug)]
pub struct TaskConfigBuilder {
    task: RawTaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(cmd: &str) -> Self {
        Self {
            task: RawTaskConfig::new(cmd),
        }
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn retry(mut self, retry: u32) -> Self {
        self.task.retry = Some(retry);
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.task.timeout = Some(timeout.to_string());
        self
    }

    pub fn use_shell(mut self, val: bool) -> Self {
        self.task.use_shell = Some(val);
        self
    }

    pub fn fail_on_stderr(mut self, val: bool) -> Self {
        self.task.fail_on_stderr = Some(val);
        self
    }

    pub fn build(self) -> RawTaskConfig {
        self.task
    }
}
