// src/exec/backend.rs

//! Pluggable step executor.
//!
//! The runner talks to a `StepExecutor` instead of calling the steps
//! directly, which lets tests swap in a fake that records what ran without
//! touching disk or spawning processes.

use std::future::Future;
use std::pin::Pin;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info, warn};

use crate::bundle::{minifier_for, run_bundle};
use crate::clean::clean_paths;
use crate::context::PipelineContext;
use crate::dag::ScheduledStep;
use crate::engine::StepOutcome;
use crate::exec::process::run_command;
use crate::serve::{notify_running_server, start_server};
use crate::types::StepKind;
use crate::watch::{WatchProfile, spawn_watcher};

/// Trait abstracting how a scheduled step is executed.
///
/// The returned future completes when the step is done. `Ok` carries the
/// step's outcome; `Err` means the step could not run at all and counts as
/// a failure.
pub trait StepExecutor: Send + Sync {
    fn execute<'a>(
        &'a self,
        step: &'a ScheduledStep,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<StepOutcome>> + Send + 'a>>;
}

/// Executor used in production: dispatches on [`StepKind`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RealStepExecutor;

impl RealStepExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl StepExecutor for RealStepExecutor {
    fn execute<'a>(
        &'a self,
        step: &'a ScheduledStep,
        ctx: &'a PipelineContext,
    ) -> Pin<Box<dyn Future<Output = Result<StepOutcome>> + Send + 'a>> {
        Box::pin(async move {
            match step.kind {
                StepKind::Clean => clean(ctx),
                StepKind::Bundle => bundle(ctx),
                StepKind::Generate => generate(step, ctx).await,
                StepKind::Command => command(step, ctx).await,
                StepKind::Serve => serve(ctx).await,
                StepKind::Watch => watch(ctx).await,
                StepKind::Reload => reload(ctx).await,
                StepKind::Group => Ok(StepOutcome::Success),
            }
        })
    }
}

fn exit_outcome(code: i32) -> StepOutcome {
    if code == 0 {
        StepOutcome::Success
    } else {
        StepOutcome::Failed(code)
    }
}

fn clean(ctx: &PipelineContext) -> Result<StepOutcome> {
    let report = clean_paths(ctx.fs(), ctx.root(), &ctx.config().clean().paths);
    if !report.is_clean() {
        warn!(failed = report.failed.len(), "some paths could not be removed");
    }
    Ok(StepOutcome::Success)
}

fn bundle(ctx: &PipelineContext) -> Result<StepOutcome> {
    let cfg = ctx.config().bundle();
    let minifier = minifier_for(cfg);
    let report = run_bundle(ctx.fs(), ctx.root(), cfg, minifier.as_ref())?;
    debug!(status = ?report.status, digest = ?report.digest, "bundle result");
    Ok(StepOutcome::Success)
}

async fn generate(step: &ScheduledStep, ctx: &PipelineContext) -> Result<StepOutcome> {
    let cfg = ctx.config().generate();
    let cwd = match &cfg.cwd {
        Some(dir) => ctx.root().join(dir),
        None => ctx.root().to_path_buf(),
    };
    let code = run_command(&step.name, &cfg.cmd, &cwd).await?;
    Ok(exit_outcome(code))
}

async fn command(step: &ScheduledStep, ctx: &PipelineContext) -> Result<StepOutcome> {
    let cmd = step
        .cmd
        .as_deref()
        .ok_or_else(|| anyhow!("task '{}' has no `cmd`", step.name))?;
    let code = run_command(&step.name, cmd, ctx.root()).await?;
    Ok(exit_outcome(code))
}

async fn serve(ctx: &PipelineContext) -> Result<StepOutcome> {
    if ctx.has_server().await {
        debug!("server already running");
        return Ok(StepOutcome::Success);
    }

    let handle = start_server(ctx.config().serve(), ctx.site_dir())
        .await
        .context("starting dev server")?;
    ctx.install_server(handle).await;
    Ok(StepOutcome::Success)
}

/// Setup problems are logged and the pipeline carries on without watching.
async fn watch(ctx: &PipelineContext) -> Result<StepOutcome> {
    if ctx.has_watcher().await {
        debug!("file watcher already running");
        return Ok(StepOutcome::Success);
    }

    let started = WatchProfile::from_config(ctx.config(), ctx.root())
        .and_then(|profile| spawn_watcher(ctx.root(), profile, ctx.event_sender()));

    match started {
        Ok(handle) => ctx.install_watcher(handle).await,
        Err(err) => error!(error = %format!("{err:#}"), "file watching disabled"),
    }
    Ok(StepOutcome::Success)
}

/// In-process server first; otherwise try a server started by another
/// `blogpipe` process. Nobody to notify is not a failure.
async fn reload(ctx: &PipelineContext) -> Result<StepOutcome> {
    if let Some(hub) = ctx.reload_hub().await {
        hub.reload();
        return Ok(StepOutcome::Success);
    }

    match notify_running_server(ctx.config().serve()).await {
        Ok((port, version)) => info!(port, version, "reloaded clients of running server"),
        Err(err) => warn!(error = %format!("{err:#}"), "nothing to reload"),
    }
    Ok(StepOutcome::Success)
}
