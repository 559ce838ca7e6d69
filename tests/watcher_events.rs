// tests/watcher_events.rs

mod common;
use crate::common::{init_tracing, with_timeout, write_file};

use std::time::Duration;

use tokio::sync::mpsc;

use blogpipe::engine::RuntimeEvent;
use blogpipe::watch::{WatchProfile, spawn_watcher};

#[tokio::test]
async fn matching_change_is_forwarded_and_outputs_are_not() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("js")).unwrap();
    std::fs::create_dir_all(dir.path().join("_site")).unwrap();

    let profile = WatchProfile::new(
        &["js/**/*.js".to_string(), "_site/**".to_string()],
        &["js/main.min.js".to_string(), "_site/**".to_string()],
    )
    .unwrap();
    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_watcher(dir.path(), profile, tx).unwrap();

    // Give the backend a moment to register the watch.
    tokio::time::sleep(Duration::from_millis(100)).await;
    write_file(dir.path(), "_site/index.html", "ignored");
    write_file(dir.path(), "js/main.min.js", "ignored");
    write_file(dir.path(), "js/app.js", "var a=1;");

    let event = with_timeout(rx.recv()).await.unwrap();
    match event {
        RuntimeEvent::FilesChanged { paths } => {
            assert!(!paths.is_empty());
            assert!(paths.iter().all(|p| p.ends_with("js/app.js")), "got {paths:?}");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    handle.stop();
}
