// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Read and deserialize a config file without semantic validation.
///
/// Use [`load_and_validate`] to also check task references and cycles.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Deserialize config text.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file and validate it.
///
/// Checks that there is at least one task, that every `after`/`order` name
/// is defined, that timeouts parse and that the precedence graph is acyclic.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    debug!(
        path = %path.display(),
        tasks = config.task.len(),
        "configuration loaded"
    );
    Ok(config)
}

/// `Rundag.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rundag.toml")
}
