// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use crate::config::model::ConfigFile;
use crate::errors::{PipelineError, Result};
use crate::types::StepKind;

/// Internal node structure: what the task runs plus its edges.
#[derive(Debug, Clone)]
struct TaskNode {
    kind: StepKind,
    cmd: Option<String>,
    /// Direct dependencies, in `after` declaration order.
    deps: Vec<String>,
    /// Direct dependents: tasks that list this one in their `after`.
    dependents: Vec<String>,
}

/// In-memory task graph keyed by task name.
///
/// Acyclicity and reference validity are checked in `config::validate`;
/// here we just keep adjacency information for planning and diagnostics.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: HashMap<String, TaskNode>,
}

impl TaskGraph {
    /// Build the graph from a validated [`ConfigFile`].
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let mut nodes: HashMap<String, TaskNode> = HashMap::new();

        for (name, task) in cfg.tasks().iter() {
            nodes.insert(
                name.clone(),
                TaskNode {
                    kind: task.kind,
                    cmd: task.cmd.clone(),
                    deps: task.after.clone(),
                    dependents: Vec::new(),
                },
            );
        }

        // Iterate the config (BTreeMap) so dependents come out sorted.
        for (name, task) in cfg.tasks().iter() {
            for dep in task.after.iter() {
                if let Some(dep_node) = nodes.get_mut(dep) {
                    dep_node.dependents.push(name.clone());
                }
            }
        }

        Self { nodes }
    }

    /// All task names, sorted.
    pub fn tasks(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<StepKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    pub fn cmd_of(&self, name: &str) -> Option<&str> {
        self.nodes.get(name).and_then(|n| n.cmd.as_deref())
    }

    /// Immediate dependencies of a task (the tasks listed in its `after`).
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task (tasks that list this one in their `after`).
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Execution order for `target`: every transitive predecessor,
    /// depth-first and left to right through each `after` list, each task
    /// once, then `target` itself.
    ///
    /// ```text
    /// default = after [clean, generate, serve, watch]
    /// generate = after [bundle]
    ///
    /// plan("default") = clean, bundle, generate, serve, watch, default
    /// ```
    pub fn plan(&self, target: &str) -> Result<Vec<String>> {
        if !self.contains(target) {
            return Err(PipelineError::TaskNotFound(target.to_string()));
        }

        let mut order = Vec::new();
        let mut visited = HashSet::new();
        self.visit(target, &mut visited, &mut order);
        Ok(order)
    }

    fn visit(&self, name: &str, visited: &mut HashSet<String>, order: &mut Vec<String>) {
        if !visited.insert(name.to_string()) {
            return;
        }
        for dep in self.dependencies_of(name) {
            self.visit(dep, visited, order);
        }
        order.push(name.to_string());
    }
}
