// src/fs/paths.rs

//! Path and glob helpers shared by the clean, bundle and watch steps.
//!
//! Globs are matched against project-relative paths with forward slashes
//! (`js/utils/views.js`). `*` never crosses a `/`; use `**` for recursion.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

use super::FileSystem;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(slash_path(rel));
    }

    // macOS reports events under /private/var/... for /var/... roots.
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(slash_path(rel));
        }
    }

    None
}

/// Render a relative path with `/` separators and no leading `./`.
pub fn slash_path(rel: &Path) -> String {
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(seg) => Some(seg.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Strip a leading `./` so config entries like `./js/**/*.js` behave.
pub fn normalize_pattern(pattern: &str) -> &str {
    pattern.trim_start_matches("./")
}

pub fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_META)
}

/// The directory a glob can only match below: every leading segment free of
/// glob metacharacters.
///
/// `js/**/*.js` → `js`, `*.js` → ``, `js/main.js` → `js/main.js`.
pub fn literal_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for segment in normalize_pattern(pattern).split('/') {
        if segment.is_empty() {
            continue;
        }
        if is_glob(segment) {
            break;
        }
        base.push(segment);
    }
    base
}

/// Compile a single glob with `/`-aware `*`.
pub fn compile_glob(pattern: &str) -> Result<globset::GlobMatcher> {
    let glob = GlobBuilder::new(normalize_pattern(pattern))
        .literal_separator(true)
        .build()
        .with_context(|| format!("invalid glob pattern: {pattern}"))?;
    Ok(glob.compile_matcher())
}

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(normalize_pattern(pat))
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Files found by [`walk_files`], plus directories that could not be listed.
#[derive(Debug, Default)]
pub struct Walk {
    pub files: Vec<PathBuf>,
    pub unreadable: Vec<(PathBuf, String)>,
}

/// Collect every file at or below `start`, sorted.
///
/// A missing `start` yields an empty list; a file yields itself. A directory
/// that cannot be listed is logged and skipped; the rest of the tree is
/// still walked.
pub fn walk_files(fs: &dyn FileSystem, start: &Path) -> Walk {
    let mut walk = Walk::default();

    if fs.is_file(start) {
        walk.files.push(start.to_path_buf());
        return walk;
    }
    if !fs.is_dir(start) {
        return walk;
    }

    let mut stack = vec![start.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match fs.read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(path = ?dir, error = %format!("{err:#}"), "skipping unreadable directory");
                walk.unreadable.push((dir, format!("{err:#}")));
                continue;
            }
        };
        for path in entries {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                walk.files.push(path);
            }
        }
    }

    walk.files.sort();
    walk
}
