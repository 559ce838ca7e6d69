// src/config/mod.rs

//! Configuration loading and validation for blogpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the task graph and section invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_for_cli, load_from_path, load_from_str};
pub use model::{
    default_tasks, BundleSection, CleanSection, ConfigFile, GenerateSection, RawConfigFile,
    ServeSection, SiteSection, TaskConfig, WatchSection,
};
