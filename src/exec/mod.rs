// src/exec/mod.rs

//! Step execution layer.
//!
//! - [`backend`] provides the `StepExecutor` trait and the production
//!   `RealStepExecutor`, which tests can replace with a fake.
//! - [`process`] runs shell commands (`generate`, `command` tasks) with
//!   `tokio::process::Command`.

pub mod backend;
pub mod process;

pub use backend::{RealStepExecutor, StepExecutor};
pub use process::run_command;
