// src/config/mod.rs

//! Configuration loading and validation for rundag.
//!
//! - `model.rs`: TOML-backed data model and the validated `ConfigFile`.
//! - `loader.rs`: read a config file from disk.
//! - `validate.rs`: reference, timeout and cycle checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_str};
pub use model::{
    ConfigFile, ConfigSection, DEFAULT_RETRY, DefaultSection, RawConfigFile, RawTaskConfig,
    TaskConfig,
};
