// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `rundag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rundag",
    version,
    about = "Run a set of commands once, in dependency order.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Append logs to this file instead of stderr.
    ///
    /// Overrides `[config].log_file`.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Parse and validate, print tasks and the execution order, run nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_rundag_toml() {
        let args = CliArgs::try_parse_from(["rundag"]).unwrap();
        assert_eq!(args.config, default_config_path());
        assert_eq!(args.config, PathBuf::from("Rundag.toml"));
        assert!(!args.dry_run);
        assert_eq!(args.log_level, None);
    }

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "rundag",
            "--config",
            "ci/pipeline.toml",
            "--log-level",
            "debug",
            "--log-file",
            "run.log",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.config, PathBuf::from("ci/pipeline.toml"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert_eq!(args.log_file, Some(PathBuf::from("run.log")));
        assert!(args.dry_run);
    }
}
