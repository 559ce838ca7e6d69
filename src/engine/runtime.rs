// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::context::PipelineContext;

use super::queue::ChangeQueue;
use super::runner::TaskRunner;
use super::RuntimeEvent;

/// Counters reported when the runtime exits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub rebuilds: usize,
    pub failed: usize,
}

/// Event loop that keeps the pipeline alive after the initial run.
///
/// It is the single consumer of `RuntimeEvent`s and the only caller of the
/// runner, so at most one rebuild is ever in flight. File changes that
/// arrive while a rebuild runs are folded into one pending batch, which is
/// rebuilt once the current run ends.
pub struct Runtime {
    runner: Arc<TaskRunner>,
    ctx: Arc<PipelineContext>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    target: String,
    debounce: Duration,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("target", &self.target)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        runner: Arc<TaskRunner>,
        ctx: Arc<PipelineContext>,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        target: impl Into<String>,
        debounce: Duration,
    ) -> Self {
        Self {
            runner,
            ctx,
            event_rx,
            target: target.into(),
            debounce,
        }
    }

    /// Main event loop.
    ///
    /// Runs until `ShutdownRequested` arrives or the channel closes, then
    /// releases the context's server and watcher.
    pub async fn run(mut self) -> RuntimeStats {
        info!(target = %self.target, "watching for changes");

        let mut stats = RuntimeStats::default();
        let mut pending = ChangeQueue::new();

        loop {
            if pending.is_empty() {
                match self.event_rx.recv().await {
                    Some(RuntimeEvent::FilesChanged { paths }) => pending.record(paths),
                    Some(RuntimeEvent::ShutdownRequested) => {
                        info!("shutdown requested");
                        break;
                    }
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                }
            }

            if !self.settle(&mut pending).await {
                break;
            }

            let events = pending.events();
            let batch = pending.drain();
            info!(events, files = batch.len(), "changes detected; rebuilding");
            debug!(?batch, "changed files");

            match self.rebuild(&mut pending).await {
                Some(true) => stats.rebuilds += 1,
                Some(false) => {
                    stats.rebuilds += 1;
                    stats.failed += 1;
                }
                None => break,
            }
        }

        self.ctx.shutdown().await;
        info!(rebuilds = stats.rebuilds, failed = stats.failed, "runtime exiting");
        stats
    }

    /// Wait until no change has arrived for `debounce`, folding everything
    /// received meanwhile into `pending`. `false` means shut down.
    async fn settle(&mut self, pending: &mut ChangeQueue) -> bool {
        let sleep = tokio::time::sleep(self.debounce);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                event = self.event_rx.recv() => match event {
                    Some(RuntimeEvent::FilesChanged { paths }) => {
                        pending.record(paths);
                        sleep.as_mut().reset(Instant::now() + self.debounce);
                    }
                    Some(RuntimeEvent::ShutdownRequested) | None => {
                        info!("shutdown requested while waiting for changes to settle");
                        return false;
                    }
                }
            }
        }
    }

    /// Run the target once. Changes arriving meanwhile go to `pending`.
    ///
    /// `Some(succeeded)` when the run completed, `None` when shutdown
    /// interrupted it (dropping the run kills any child process).
    async fn rebuild(&mut self, pending: &mut ChangeQueue) -> Option<bool> {
        let run = self.runner.run(&self.ctx, &self.target);
        tokio::pin!(run);

        loop {
            tokio::select! {
                result = &mut run => {
                    return match result {
                        Ok(report) => {
                            if !report.succeeded() {
                                warn!(
                                    run_id = report.run_id,
                                    failed = ?report.failed,
                                    "rebuild failed; waiting for the next change"
                                );
                            }
                            Some(report.succeeded())
                        }
                        Err(err) => {
                            error!(error = %err, "rebuild could not start");
                            Some(false)
                        }
                    };
                }
                event = self.event_rx.recv() => match event {
                    Some(RuntimeEvent::FilesChanged { paths }) => {
                        debug!(?paths, "change during rebuild; queued");
                        pending.record(paths);
                    }
                    Some(RuntimeEvent::ShutdownRequested) | None => {
                        info!("shutdown requested during rebuild; abandoning it");
                        return None;
                    }
                }
            }
        }
    }
}
