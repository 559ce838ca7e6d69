// src/lib.rs

pub mod bundle;
pub mod clean;
pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod serve;
pub mod types;
pub mod watch;

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, Invocation};
use crate::config::{ConfigFile, load_for_cli};
use crate::context::PipelineContext;
use crate::dag::TaskGraph;
use crate::engine::{RunReport, Runtime, RuntimeEvent, TaskRunner};
use crate::exec::RealStepExecutor;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - task graph / runner / executor
/// - the initial run (task + predecessors, or one standalone step)
/// - the watch runtime, when a server or watcher is left running
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let explicit = args.config.as_deref().map(Path::new);
    let (cfg, config_path) = load_for_cli(explicit)?;
    let root = project_root(config_path.as_deref(), &cfg.site().root);
    let graph = TaskGraph::from_config(&cfg);
    let invocation = args.invocation();

    if args.dry_run {
        print_dry_run(&cfg, config_path.as_deref(), &root, &graph, &invocation)?;
        return Ok(());
    }

    let cfg = Arc::new(cfg);
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let ctx = Arc::new(PipelineContext::new(
        Arc::clone(&cfg),
        root,
        Arc::new(RealFileSystem),
        rt_tx.clone(),
    ));
    let runner = Arc::new(TaskRunner::new(graph, Arc::new(RealStepExecutor::new())));

    info!(root = ?ctx.root(), "blogpipe starting");

    let initial = async {
        match &invocation {
            Invocation::WithDependencies(task) => runner.run(&ctx, task).await,
            Invocation::Standalone(kind) => Ok(runner.run_standalone(&ctx, *kind).await),
        }
    };

    // Ctrl-C during the initial run drops it (killing any child process).
    let report = tokio::select! {
        report = initial => report?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted during initial run");
            ctx.shutdown().await;
            bail!("interrupted");
        }
    };

    if ctx.has_long_lived().await && !args.once {
        if !report.succeeded() {
            warn!(failed = ?report.failed, "initial run failed; still watching");
        }

        // Ctrl-C → graceful shutdown.
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            request_shutdown(&rt_tx).await;
        });

        let watch = cfg.watch();
        let runtime = Runtime::new(
            Arc::clone(&runner),
            Arc::clone(&ctx),
            rt_rx,
            watch.run.clone(),
            Duration::from_millis(watch.debounce_ms),
        );
        runtime.run().await;
        return Ok(());
    }

    ctx.shutdown().await;
    finish(&report)
}

/// Ask the runtime to stop. Returns false when it is already gone.
async fn request_shutdown(tx: &mpsc::Sender<RuntimeEvent>) -> bool {
    if tx.send(RuntimeEvent::ShutdownRequested).await.is_err() {
        debug!("runtime already stopped; shutdown request dropped");
        return false;
    }
    true
}

fn finish(report: &RunReport) -> Result<()> {
    match &report.failed {
        None => Ok(()),
        Some(task) => bail!(
            "task '{}' failed (run {} of '{}'; skipped: {:?})",
            task,
            report.run_id,
            report.target,
            report.skipped
        ),
    }
}

/// Figure out the project root.
///
/// Relative `[site].root` is anchored at the directory holding the config
/// file, or the working directory when running on built-in defaults or a
/// bare filename like "Blogpipe.toml".
pub fn project_root(config_path: Option<&Path>, site_root: &Path) -> PathBuf {
    let base = match config_path.and_then(Path::parent) {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    base.join(site_root)
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Print the task table and the resolved execution plan.
fn print_dry_run(
    cfg: &ConfigFile,
    config_path: Option<&Path>,
    root: &Path,
    graph: &TaskGraph,
    invocation: &Invocation,
) -> Result<()> {
    println!("blogpipe dry-run");
    match config_path {
        Some(path) => println!("  config: {}", path.display()),
        None => println!("  config: (built-in defaults)"),
    }
    println!("  root: {}", root.display());
    println!("  bundle: {:?} -> {}", cfg.bundle().include, cfg.bundle().output.display());
    println!("  generate: {}", cfg.generate().cmd);
    println!("  serve: {}:{}", cfg.serve().host, cfg.serve().port);
    println!("  watch.run: {}", cfg.watch().run);
    println!();

    println!("tasks ({}):", cfg.tasks().len());
    for (name, task) in cfg.tasks().iter() {
        println!("  - {name} [{}]", task.kind);
        if !task.after.is_empty() {
            println!("      after: {:?}", task.after);
        }
        if let Some(ref cmd) = task.cmd {
            println!("      cmd: {cmd}");
        }
    }
    println!();

    match invocation {
        Invocation::WithDependencies(task) => {
            let plan = graph.plan(task)?;
            println!("plan for '{task}': {}", plan.join(" -> "));
        }
        Invocation::Standalone(kind) => {
            println!("plan: {kind} (standalone, no predecessors)");
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
