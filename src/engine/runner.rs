// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, error, info};

use crate::context::PipelineContext;
use crate::dag::{ScheduledStep, TaskGraph};
use crate::errors::Result;
use crate::exec::StepExecutor;
use crate::types::StepKind;

use super::StepOutcome;

/// What one run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    pub target: String,
    /// Steps that ran, in order, with their outcome. The last entry is the
    /// failed step when the run failed.
    pub executed: Vec<(String, StepOutcome)>,
    /// Steps that never started because an earlier one failed.
    pub skipped: Vec<String>,
    /// The step that failed, if any.
    pub failed: Option<String>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_none()
    }

    /// Names of the executed steps, in order.
    pub fn executed_names(&self) -> Vec<&str> {
        self.executed.iter().map(|(n, _)| n.as_str()).collect()
    }
}

/// Runs a task after its transitive predecessors, one step at a time.
///
/// Each step is awaited to completion before the next starts; the first
/// failure stops the run. There are no retries.
pub struct TaskRunner {
    graph: TaskGraph,
    executor: Arc<dyn StepExecutor>,
    /// Monotonically increasing run ID.
    run_counter: AtomicU64,
}

impl fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRunner")
            .field("graph", &self.graph)
            .field("run_counter", &self.run_counter)
            .finish_non_exhaustive()
    }
}

impl TaskRunner {
    pub fn new(graph: TaskGraph, executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            graph,
            executor,
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    fn next_run_id(&self) -> u64 {
        self.run_counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Run `target` and everything it depends on.
    ///
    /// `Err` only for an unknown target; step failures are reported in the
    /// returned [`RunReport`].
    pub async fn run(&self, ctx: &PipelineContext, target: &str) -> Result<RunReport> {
        let order = self.graph.plan(target)?;
        let run_id = self.next_run_id();

        let steps: Vec<ScheduledStep> = order
            .iter()
            .filter_map(|name| ScheduledStep::from_graph(&self.graph, name, run_id))
            .collect();

        info!(run_id, target = %target, plan = ?order, "starting run");
        Ok(self.execute_steps(ctx, target, run_id, steps).await)
    }

    /// Run a single step kind with no predecessors (standalone CLI commands).
    pub async fn run_standalone(&self, ctx: &PipelineContext, kind: StepKind) -> RunReport {
        let run_id = self.next_run_id();
        let step = ScheduledStep::standalone(kind, run_id);
        info!(run_id, step = %kind, "starting standalone step");
        self.execute_steps(ctx, kind.as_str(), run_id, vec![step])
            .await
    }

    async fn execute_steps(
        &self,
        ctx: &PipelineContext,
        target: &str,
        run_id: u64,
        steps: Vec<ScheduledStep>,
    ) -> RunReport {
        let mut report = RunReport {
            run_id,
            target: target.to_string(),
            executed: Vec::with_capacity(steps.len()),
            skipped: Vec::new(),
            failed: None,
        };

        let mut steps = steps.into_iter();
        for step in steps.by_ref() {
            let outcome = self.execute_one(ctx, &step).await;
            report.executed.push((step.name.clone(), outcome));

            if let StepOutcome::Failed(code) = outcome {
                error!(
                    task = %step.name,
                    run_id,
                    exit_code = code,
                    "task failed; skipping remaining steps"
                );
                report.failed = Some(step.name);
                break;
            }
        }
        report.skipped = steps.map(|s| s.name).collect();

        if report.succeeded() {
            info!(run_id, target = %target, steps = report.executed.len(), "run finished");
        } else {
            debug!(run_id, skipped = ?report.skipped, "run aborted");
        }

        report
    }

    async fn execute_one(&self, ctx: &PipelineContext, step: &ScheduledStep) -> StepOutcome {
        // Groups only order their predecessors.
        if step.kind == StepKind::Group {
            debug!(task = %step.name, run_id = step.run_id, "group reached");
            return StepOutcome::Success;
        }

        info!(task = %step.name, kind = %step.kind, run_id = step.run_id, "starting task");

        match self.executor.execute(step, ctx).await {
            Ok(outcome) => {
                if outcome.is_success() {
                    info!(task = %step.name, run_id = step.run_id, "task finished");
                }
                outcome
            }
            Err(err) => {
                error!(
                    task = %step.name,
                    run_id = step.run_id,
                    error = %format!("{err:#}"),
                    "task execution error"
                );
                StepOutcome::Failed(-1)
            }
        }
    }
}
