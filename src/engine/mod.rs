// src/engine/mod.rs

//! Orchestration engine for blogpipe.
//!
//! - [`runner`] executes a task and its predecessors, strictly in sequence.
//! - [`queue`] coalesces file changes that arrive while a rebuild is busy.
//! - [`runtime`] is the event loop behind `watch`: it reacts to file
//!   changes and shutdown requests, and is the only caller of the runner
//!   once the initial run is over, so rebuilds never overlap.

use std::path::PathBuf;

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    /// Non-zero exit code (or `-1` when the step could not run at all).
    Failed(i32),
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success)
    }
}

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Watched files were created, modified or removed.
    FilesChanged { paths: Vec<PathBuf> },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod queue;
pub mod runner;
pub mod runtime;

pub use queue::ChangeQueue;
pub use runner::{RunReport, TaskRunner};
pub use runtime::{Runtime, RuntimeStats};
