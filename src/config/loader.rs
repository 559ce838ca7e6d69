// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

/// File looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Blogpipe.toml";

/// Parse TOML text into a `RawConfigFile`.
///
/// This only performs deserialization; semantic checks happen in
/// `ConfigFile::try_from`.
pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls, plus the
///   built-in task graph when no tasks are declared).
/// - Checks for unknown `after` references, cycles, and section sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Resolve the config the CLI should use.
///
/// - An explicit path must exist.
/// - Without one, `Blogpipe.toml` is used if present, otherwise the built-in
///   defaults.
///
/// Returns the config plus the path it came from (if any), which anchors
/// relative paths.
pub fn load_for_cli(explicit: Option<&Path>) -> Result<(ConfigFile, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(PipelineError::ConfigError(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            Ok((load_and_validate(path)?, Some(path.to_path_buf())))
        }
        None => {
            let path = default_config_path();
            if path.exists() {
                Ok((load_and_validate(&path)?, Some(path)))
            } else {
                info!(
                    "no {} found; using built-in defaults",
                    DEFAULT_CONFIG_FILE
                );
                Ok((ConfigFile::try_from(RawConfigFile::default())?, None))
            }
        }
    }
}

/// Helper to resolve the default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}
