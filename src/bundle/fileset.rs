// src/bundle/fileset.rs

//! Resolution of the ordered bundle input set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::fs::paths::{build_globset, compile_glob, literal_base, relative_str, slash_path, walk_files};
use crate::fs::FileSystem;

/// Resolve `include ∖ exclude` below `root`, never including `output`.
///
/// Order: include patterns in the order given; within one pattern, paths
/// sort lexicographically; a file matched by several patterns keeps its
/// first position. The set is recomputed on every call.
pub fn resolve_file_set(
    fs: &dyn FileSystem,
    root: &Path,
    include: &[String],
    exclude: &[String],
    output: &Path,
) -> Result<Vec<PathBuf>> {
    let exclude_set = if exclude.is_empty() {
        None
    } else {
        Some(build_globset(exclude)?)
    };
    let output_rel = output_relative(root, output);

    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    for pattern in include {
        let matcher = compile_glob(pattern)?;
        let base = root.join(literal_base(pattern));

        for path in walk_files(fs, &base).files {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if !matcher.is_match(&rel) {
                continue;
            }
            if rel == output_rel {
                debug!(path = %rel, "bundle output excluded from its own inputs");
                continue;
            }
            if exclude_set.as_ref().is_some_and(|set| set.is_match(&rel)) {
                continue;
            }
            if seen.insert(path.clone()) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// The bundle output as a root-relative, `/`-separated string.
pub fn output_relative(root: &Path, output: &Path) -> String {
    if output.is_absolute() {
        relative_str(root, output).unwrap_or_else(|| slash_path(output))
    } else {
        slash_path(output)
    }
}
