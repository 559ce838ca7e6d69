// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Task run when no command is given.
pub const DEFAULT_TASK: &str = "default";

/// Command-line arguments for `blogpipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "blogpipe",
    version,
    about = "Clean, bundle, generate and serve a static blog with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Blogpipe.toml` in the current working directory, falling
    /// back to built-in defaults when that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BLOGPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the task graph and plan, but don't execute.
    #[arg(long)]
    pub dry_run: bool,

    /// Exit after the initial run even if a server or watcher was started.
    #[arg(long)]
    pub once: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Entry points.
///
/// `run` executes a task together with its predecessors. The remaining
/// commands execute one step on its own.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a task and all of its transitive predecessors.
    Run {
        /// Task name from the config (default: `default`).
        #[arg(value_name = "TASK", default_value = DEFAULT_TASK)]
        task: String,
    },
    /// Remove previous build output, cache and bundle.
    Clean,
    /// Concatenate and minify the script sources.
    Bundle,
    /// Run the static-site generator once.
    Generate,
    /// Serve the generated site until interrupted.
    Serve,
    /// Ask a running dev server to reload connected browsers.
    Reload,
}

/// What the CLI asked us to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Run `task` after its predecessors.
    WithDependencies(String),
    /// Run a single step kind with no predecessors.
    Standalone(crate::types::StepKind),
}

impl CliArgs {
    pub fn invocation(&self) -> Invocation {
        use crate::types::StepKind;

        match &self.command {
            None => Invocation::WithDependencies(DEFAULT_TASK.to_string()),
            Some(Command::Run { task }) => Invocation::WithDependencies(task.clone()),
            Some(Command::Clean) => Invocation::Standalone(StepKind::Clean),
            Some(Command::Bundle) => Invocation::Standalone(StepKind::Bundle),
            Some(Command::Generate) => Invocation::Standalone(StepKind::Generate),
            Some(Command::Serve) => Invocation::Standalone(StepKind::Serve),
            Some(Command::Reload) => Invocation::Standalone(StepKind::Reload),
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
