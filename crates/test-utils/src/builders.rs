#![allow(dead_code)]

use std::path::PathBuf;

use blogpipe::config::{ConfigFile, RawConfigFile, TaskConfig};
use blogpipe::errors::Result;
use blogpipe::types::StepKind;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in section defaults with no tasks; if no task is
/// added, validation falls back to the built-in task graph.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_bundle_include(mut self, patterns: &[&str]) -> Self {
        self.config.bundle.include = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_bundle_exclude(mut self, patterns: &[&str]) -> Self {
        self.config.bundle.exclude = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_bundle_output(mut self, output: &str) -> Self {
        self.config.bundle.output = PathBuf::from(output);
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.config.bundle.minify = minify;
        self
    }

    pub fn with_clean_paths(mut self, paths: &[&str]) -> Self {
        self.config.clean.paths = paths.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_generate_cmd(mut self, cmd: &str) -> Self {
        self.config.generate.cmd = cmd.to_string();
        self
    }

    pub fn with_serve_port(mut self, port: u16) -> Self {
        self.config.serve.port = port;
        self
    }

    pub fn with_watch_run(mut self, task: &str) -> Self {
        self.config.watch.run = task.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(kind: StepKind) -> Self {
        Self {
            task: TaskConfig::new(kind),
        }
    }

    /// Shorthand for a `command` task.
    pub fn command(cmd: &str) -> Self {
        Self::new(StepKind::Command).cmd(cmd)
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.task.cmd = Some(cmd.to_string());
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
