// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{default_tasks, ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::types::StepKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        if raw.task.is_empty() {
            raw.task = default_tasks();
        }
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_sections(cfg)?;
    validate_task_fields(cfg)?;
    validate_task_dependencies(cfg)?;
    validate_dag(cfg)?;
    validate_watch_target(cfg)?;
    Ok(())
}

fn validate_sections(cfg: &RawConfigFile) -> Result<()> {
    if cfg.bundle.output.as_os_str().is_empty() {
        return Err(PipelineError::ConfigError(
            "[bundle].output must not be empty".to_string(),
        ));
    }

    if cfg.generate.cmd.trim().is_empty() {
        return Err(PipelineError::ConfigError(
            "[generate].cmd must not be empty".to_string(),
        ));
    }

    if cfg.serve.port_retries == 0 {
        return Err(PipelineError::ConfigError(
            "[serve].port_retries must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_task_fields(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if task.kind == StepKind::Command {
            let has_cmd = task.cmd.as_deref().is_some_and(|c| !c.trim().is_empty());
            if !has_cmd {
                return Err(PipelineError::ConfigError(format!(
                    "task '{}' has kind = \"command\" but no `cmd`",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn validate_task_dependencies(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            if dep == name {
                return Err(PipelineError::ConfigError(format!(
                    "task '{}' cannot depend on itself in `after`",
                    name
                )));
            }
            if !cfg.task.contains_key(dep) {
                return Err(PipelineError::ConfigError(format!(
                    "task '{}' has unknown dependency '{}' in `after`",
                    name, dep
                )));
            }
        }
    }
    Ok(())
}

fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    // Edge direction: dep -> task
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for dep in task.after.iter() {
            graph.add_edge(dep.as_str(), name.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(PipelineError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}

/// The watcher runs `[watch].run` on every change, so it must exist whenever
/// some task actually watches.
fn validate_watch_target(cfg: &RawConfigFile) -> Result<()> {
    let has_watch = cfg.task.values().any(|t| t.kind == StepKind::Watch);
    if !has_watch {
        return Ok(());
    }

    match cfg.task.get(&cfg.watch.run) {
        None => Err(PipelineError::ConfigError(format!(
            "[watch].run names unknown task '{}'",
            cfg.watch.run
        ))),
        Some(task) if matches!(task.kind, StepKind::Watch | StepKind::Serve) => {
            Err(PipelineError::ConfigError(format!(
                "[watch].run task '{}' must not be a {} task",
                cfg.watch.run, task.kind
            )))
        }
        Some(_) => Ok(()),
    }
}
