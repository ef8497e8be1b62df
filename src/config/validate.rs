// src/config/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{
    ConfigFile, DEFAULT_RETRY, DefaultSection, RawConfigFile, RawTaskConfig, TaskConfig,
};
use crate::errors::{Result, RundagError};
use crate::exec::parse_duration;
use crate::types::StoreMode;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RundagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let mut tasks = BTreeMap::new();
        for (name, task) in raw.task {
            let resolved = resolve_task(&name, task, &raw.default)?;
            tasks.insert(name, resolved);
        }

        Ok(ConfigFile::new_unchecked(raw.config, tasks, raw.order))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_order_pairs(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(RundagError::ConfigError(
            "config must contain at least one [task.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.store == StoreMode::Text
        && cfg
            .config
            .project_name
            .as_deref()
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(RundagError::ConfigError(
            "[config].project_name is required when store = \"text\"".to_string(),
        ));
    }

    if let Some(timeout) = &cfg.default.timeout {
        parse_duration(timeout).map_err(|e| {
            RundagError::ConfigError(format!("[default].timeout is invalid: {e}"))
        })?;
    }

    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.cmd.trim().is_empty() {
            return Err(RundagError::ConfigError(format!(
                "task '{name}' has an empty `cmd`"
            )));
        }
        for dep in task.after.iter() {
            if dep == name {
                return Err(RundagError::ConfigError(format!(
                    "task '{name}' cannot depend on itself in `after`"
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(RundagError::ConfigError(format!(
                    "task '{name}' has unknown dependency '{dep}' in `after`"
                )));
            }
        }
    }
    Ok(())
}

fn validate_order_pairs(cfg: &RawConfigFile) -> Result<()> {
    for (upstream, downstream) in cfg.order.iter() {
        for name in [upstream, downstream] {
            if !cfg.task.contains_key(name) {
                return Err(RundagError::ConfigError(format!(
                    "`order` pair ({upstream}, {downstream}) refers to unknown task '{name}'"
                )));
            }
        }
        if upstream == downstream {
            return Err(RundagError::ConfigError(format!(
                "`order` pair ({upstream}, {downstream}) makes a task depend on itself"
            )));
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task, so `after = ["A"]` on B gives A -> B.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    for (upstream, downstream) in cfg.order.iter() {
        graph.add_edge(upstream.as_str(), downstream.as_str(), ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(RundagError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}

fn resolve_task(name: &str, task: RawTaskConfig, defaults: &DefaultSection) -> Result<TaskConfig> {
    let timeout = match task.timeout.as_ref().or(defaults.timeout.as_ref()) {
        Some(raw) => Some(parse_duration(raw).map_err(|e| {
            RundagError::ConfigError(format!("task '{name}' has an invalid timeout: {e}"))
        })?),
        None => None,
    };

    Ok(TaskConfig {
        cmd: task.cmd,
        after: task.after,
        retry: task.retry.or(defaults.retry).unwrap_or(DEFAULT_RETRY),
        timeout,
        use_shell: task.use_shell.or(defaults.use_shell).unwrap_or(true),
        fail_on_stderr: task
            .fail_on_stderr
            .or(defaults.fail_on_stderr)
            .unwrap_or(true),
    })
}
