// src/clean.rs

//! Removal of previous build output.
//!
//! Each entry in `[clean].paths` is either a literal path (file or directory,
//! removed recursively) or a glob matched against files below the project
//! root. Missing paths are not an error, and one failed removal never stops
//! the others.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::fs::paths::{compile_glob, is_glob, literal_base, normalize_pattern, relative_str, walk_files};
use crate::fs::FileSystem;

/// What a clean pass did.
#[derive(Debug, Default, Clone)]
pub struct CleanReport {
    /// Paths that were removed.
    pub removed: Vec<PathBuf>,
    /// Entries that matched nothing on disk.
    pub missing: Vec<String>,
    /// Paths (or entries) whose removal failed, with the error text.
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove every configured entry below `root`.
pub fn clean_paths(fs: &dyn FileSystem, root: &Path, entries: &[String]) -> CleanReport {
    let mut report = CleanReport::default();

    for entry in entries {
        if is_glob(entry) {
            clean_glob(fs, root, entry, &mut report);
        } else {
            clean_literal(fs, root, entry, &mut report);
        }
    }

    info!(
        removed = report.removed.len(),
        missing = report.missing.len(),
        failed = report.failed.len(),
        "clean finished"
    );

    report
}

fn clean_literal(fs: &dyn FileSystem, root: &Path, entry: &str, report: &mut CleanReport) {
    let path = root.join(normalize_pattern(entry));

    if !fs.exists(&path) {
        debug!(path = ?path, "nothing to clean");
        report.missing.push(entry.to_string());
        return;
    }

    let result = if fs.is_dir(&path) {
        fs.remove_dir_all(&path)
    } else {
        fs.remove_file(&path)
    };

    record_removal(path, result, report);
}

fn clean_glob(fs: &dyn FileSystem, root: &Path, entry: &str, report: &mut CleanReport) {
    let matcher = match compile_glob(entry) {
        Ok(m) => m,
        Err(err) => {
            warn!(pattern = %entry, error = %err, "skipping invalid clean pattern");
            report.failed.push((PathBuf::from(entry), format!("{err:#}")));
            return;
        }
    };

    let base = root.join(literal_base(entry));
    let walk = walk_files(fs, &base);
    report.failed.extend(walk.unreadable);

    let matches: Vec<PathBuf> = walk
        .files
        .into_iter()
        .filter(|path| {
            relative_str(root, path)
                .map(|rel| matcher.is_match(&rel))
                .unwrap_or(false)
        })
        .collect();

    if matches.is_empty() {
        debug!(pattern = %entry, "clean pattern matched nothing");
        report.missing.push(entry.to_string());
        return;
    }

    for path in matches {
        let result = fs.remove_file(&path);
        record_removal(path, result, report);
    }
}

fn record_removal(path: PathBuf, result: anyhow::Result<()>, report: &mut CleanReport) {
    match result {
        Ok(()) => {
            info!(path = ?path, "removed");
            report.removed.push(path);
        }
        Err(err) => {
            warn!(path = ?path, error = %err, "failed to remove; continuing");
            report.failed.push((path, format!("{err:#}")));
        }
    }
}
