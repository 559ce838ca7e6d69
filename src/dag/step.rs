// src/dag/step.rs

use crate::dag::graph::TaskGraph;
use crate::types::StepKind;

/// One step of a run, as handed to the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStep {
    pub name: String,
    pub kind: StepKind,
    /// Shell command, for `command` tasks.
    pub cmd: Option<String>,
    /// Monotonically increasing run identifier.
    ///
    /// All steps that belong to the same run share the same `run_id`.
    pub run_id: u64,
}

impl ScheduledStep {
    /// Look `name` up in the graph. `None` if the task does not exist.
    pub fn from_graph(graph: &TaskGraph, name: &str, run_id: u64) -> Option<Self> {
        let kind = graph.kind_of(name)?;
        Some(Self {
            name: name.to_string(),
            kind,
            cmd: graph.cmd_of(name).map(str::to_string),
            run_id,
        })
    }

    /// A step that is not part of the configured graph (standalone CLI
    /// commands). Named after its kind.
    pub fn standalone(kind: StepKind, run_id: u64) -> Self {
        Self {
            name: kind.as_str().to_string(),
            kind,
            cmd: None,
            run_id,
        }
    }
}
