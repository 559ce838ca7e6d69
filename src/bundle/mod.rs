// src/bundle/mod.rs

//! Concatenate and minify the JavaScript sources into one bundle file.

pub mod fileset;
pub mod minify;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::config::BundleSection;
use crate::fs::FileSystem;

pub use fileset::resolve_file_set;
pub use minify::{JsMinifier, MinifyError, Minifier, Passthrough};

/// What happened to the bundle output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleStatus {
    /// New bytes were written.
    Written,
    /// The output already held identical bytes; nothing was touched.
    Unchanged,
    /// The file set was empty; nothing was written.
    NoInputs,
}

#[derive(Debug, Clone)]
pub struct BundleReport {
    /// Inputs in concatenation order.
    pub inputs: Vec<PathBuf>,
    /// Inputs that matched but could not be read as text.
    pub skipped: Vec<PathBuf>,
    pub output: PathBuf,
    /// blake3 hex digest of the bundle bytes, when one was produced.
    pub digest: Option<String>,
    pub status: BundleStatus,
}

/// Pick the minifier `[bundle].minify` asks for.
pub fn minifier_for(cfg: &BundleSection) -> Box<dyn Minifier> {
    if cfg.minify {
        Box::new(JsMinifier)
    } else {
        Box::new(Passthrough)
    }
}

/// Resolve the file set, concatenate it with `\n`, minify and write.
///
/// A minification error returns `Err` before the output is touched, so a
/// previous good bundle survives.
pub fn run_bundle(
    fs: &dyn FileSystem,
    root: &Path,
    cfg: &BundleSection,
    minifier: &dyn Minifier,
) -> Result<BundleReport> {
    let output = root.join(&cfg.output);
    let inputs = resolve_file_set(fs, root, &cfg.include, &cfg.exclude, &output)?;

    if inputs.is_empty() {
        info!(output = ?output, "bundle file set is empty; nothing to write");
        return Ok(BundleReport {
            inputs,
            skipped: Vec::new(),
            output,
            digest: None,
            status: BundleStatus::NoInputs,
        });
    }

    let mut parts = Vec::with_capacity(inputs.len());
    let mut read_ok = Vec::with_capacity(inputs.len());
    let mut skipped = Vec::new();

    for path in inputs {
        match fs.read_to_string(&path) {
            Ok(text) => {
                debug!(path = ?path, bytes = text.len(), "bundle input");
                parts.push(text);
                read_ok.push(path);
            }
            Err(err) => {
                warn!(path = ?path, error = %err, "skipping unreadable bundle input");
                skipped.push(path);
            }
        }
    }

    let joined = parts.join("\n");
    let bundled = minifier
        .minify(&joined)
        .with_context(|| format!("minifying bundle for {:?}", output))?;

    let digest = blake3::hash(bundled.as_bytes());
    let digest_hex = digest.to_hex().to_string();

    let unchanged = fs.is_file(&output)
        && fs
            .read(&output)
            .map(|existing| blake3::hash(&existing) == digest)
            .unwrap_or(false);

    let status = if unchanged {
        debug!(output = ?output, digest = %digest_hex, "bundle unchanged; skipping write");
        BundleStatus::Unchanged
    } else {
        fs.write(&output, bundled.as_bytes())?;
        BundleStatus::Written
    };

    info!(
        inputs = read_ok.len(),
        skipped = skipped.len(),
        output = ?output,
        bytes = bundled.len(),
        "bundle finished"
    );

    Ok(BundleReport {
        inputs: read_ok,
        skipped,
        output,
        digest: Some(digest_hex),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn section(minify: bool) -> BundleSection {
        BundleSection {
            minify,
            ..BundleSection::default()
        }
    }

    #[test]
    fn concatenates_in_lexicographic_order() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/js/b.js", "var b = 2;");
        fs.add_file("/site/js/a.js", "var a = 1;");

        let report = run_bundle(&fs, Path::new("/site"), &section(false), &Passthrough).unwrap();

        assert_eq!(report.status, BundleStatus::Written);
        let out = fs.contents("/site/js/main.min.js").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn unreadable_subdirectory_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/js/a.js", "var a = 1;");
        fs.add_file("/site/js/private/secret.js", "var s = 1;");
        fs.deny_listing("/site/js/private");

        let report = run_bundle(&fs, Path::new("/site"), &section(true), &JsMinifier).unwrap();

        assert_eq!(report.inputs, vec![PathBuf::from("/site/js/a.js")]);
        assert_eq!(report.status, BundleStatus::Written);
        assert_eq!(fs.contents("/site/js/main.min.js").unwrap(), b"var a=1;");
    }

    #[test]
    fn previous_output_is_never_an_input() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/js/a.js", "var a=1;");
        fs.add_file("/site/js/main.min.js", "stale();");

        let cfg = BundleSection {
            exclude: Vec::new(),
            ..section(true)
        };
        let report = run_bundle(&fs, Path::new("/site"), &cfg, &JsMinifier).unwrap();

        assert_eq!(report.inputs, vec![PathBuf::from("/site/js/a.js")]);
        assert_eq!(fs.contents("/site/js/main.min.js").unwrap(), b"var a=1;");
    }

    #[test]
    fn unreadable_input_is_skipped() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/js/a.js", "var a=1;");
        fs.add_file("/site/js/bin.js", vec![0xff, 0xfe, 0x00]);

        let report = run_bundle(&fs, Path::new("/site"), &section(true), &JsMinifier).unwrap();

        assert_eq!(report.skipped, vec![PathBuf::from("/site/js/bin.js")]);
        assert_eq!(fs.contents("/site/js/main.min.js").unwrap(), b"var a=1;");
    }

    #[test]
    fn minify_error_leaves_previous_bundle() {
        let fs = MockFileSystem::new();
        fs.add_file("/site/js/a.js", "var s = 'broken;");
        fs.add_file("/site/js/main.min.js", "good();");

        let err = run_bundle(&fs, Path::new("/site"), &section(true), &JsMinifier).unwrap_err();

        assert!(err.downcast_ref::<MinifyError>().is_some());
        assert_eq!(fs.contents("/site/js/main.min.js").unwrap(), b"good();");
    }
}
