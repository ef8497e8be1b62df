// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;
pub mod types;

use tracing::debug;

use crate::cli::CliArgs;
use crate::config::ConfigFile;
use crate::dag::{RunSummary, Scheduler, TaskManager};
use crate::engine::Driver;
use crate::errors::Result;
use crate::exec::{ExecutorBackend, ProcessExecutor};
use crate::store::open_store;

/// High-level entry point used by `main.rs`.
///
/// Returns `true` when every task succeeded.
pub async fn run(args: &CliArgs, cfg: &ConfigFile) -> anyhow::Result<bool> {
    if args.dry_run {
        print_dry_run(cfg);
        return Ok(true);
    }

    let summary = run_session(cfg, ProcessExecutor).await?;
    Ok(summary.all_succeeded())
}

/// Scheduler over every configured task and precedence pair.
pub fn build_scheduler(cfg: &ConfigFile) -> Scheduler {
    Scheduler::with_tasks(cfg.task_names(), cfg.edges())
}

/// Run one session for `cfg` with the given executor.
pub async fn run_session<E: ExecutorBackend>(cfg: &ConfigFile, executor: E) -> Result<RunSummary> {
    let store = open_store(cfg)?;
    Driver::new(build_scheduler(cfg), cfg.task_commands(), executor, store)
        .run()
        .await
}

/// Print tasks and the initial execution order without running anything.
fn print_dry_run(cfg: &ConfigFile) {
    println!("rundag dry-run");
    println!("  config.store = {:?}", cfg.config.store);
    if let Some(ref project) = cfg.config.project_name {
        println!("  config.project_name = {project}");
    }
    println!();

    println!("tasks ({}):", cfg.task.len());
    for (name, task) in cfg.task.iter() {
        println!("  - {name}");
        println!("      cmd: {}", task.cmd);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        println!("      retry: {}", task.retry);
        if let Some(timeout) = task.timeout {
            println!("      timeout: {timeout:?}");
        }
    }
    println!();

    let order = build_scheduler(cfg).planned_order();
    println!("execution order: {}", order.join(" -> "));

    debug!("dry-run complete (no execution)");
}
