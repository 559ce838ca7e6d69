// src/watch/patterns.rs

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::bundle::fileset::output_relative;
use crate::config::ConfigFile;
use crate::fs::paths::build_globset;

/// Compiled `[watch]` patterns.
///
/// Paths are matched relative to the project root, e.g. `"_posts/hello.md"`.
/// On top of the configured excludes, the pipeline's own outputs (bundle
/// file, site directory, cache directory) never match, so a rebuild cannot
/// retrigger itself.
#[derive(Clone)]
pub struct WatchProfile {
    watch_set: GlobSet,
    exclude_set: GlobSet,
    excludes: Vec<String>,
}

impl fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchProfile")
            .field("excludes", &self.excludes)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    pub fn new(paths: &[String], exclude: &[String]) -> Result<Self> {
        let watch_set = build_globset(paths).context("building watch globset")?;
        let exclude_set = build_globset(exclude).context("building watch exclude globset")?;
        Ok(Self {
            watch_set,
            exclude_set,
            excludes: exclude.to_vec(),
        })
    }

    /// Build from `[watch]` plus the implicit output excludes. Absolute
    /// output paths are made relative to `root`.
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Result<Self> {
        let mut exclude = cfg.watch().exclude.clone();
        exclude.extend(implicit_excludes(cfg, root));
        Self::new(&cfg.watch().paths, &exclude)
    }

    /// Returns true if a change to `rel_path` should trigger a rebuild.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.watch_set.is_match(rel_path) && !self.exclude_set.is_match(rel_path)
    }

    /// All exclude patterns, configured and implicit.
    pub fn excludes(&self) -> &[String] {
        &self.excludes
    }
}

fn implicit_excludes(cfg: &ConfigFile, root: &Path) -> Vec<String> {
    let mut out = Vec::new();

    let bundle = output_relative(root, &cfg.bundle().output);
    if !bundle.is_empty() {
        out.push(bundle);
    }

    for dir in [&cfg.site().output, &cfg.site().cache] {
        let dir = output_relative(root, dir);
        if !dir.is_empty() {
            out.push(format!("{dir}/**"));
        }
    }

    out
}
