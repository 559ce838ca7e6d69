#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub use blogpipe_test_utils::{init_tracing, test_context, with_timeout};

/// Write `contents` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn read_file(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

/// A temp site with three scripts, a stale bundle, and a previous build.
pub fn sample_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_file(root, "js/a.js", "var x=1;");
    write_file(root, "js/b.js", "var y=2;");
    write_file(root, "js/c.js", "var z=3;");
    write_file(root, "js/main.min.js", "stale();");
    write_file(root, "_site/index.html", "<html><body>old</body></html>");
    write_file(root, "_posts/2016-01-01-hello.md", "# hello");
    dir
}
