// src/watch/watcher.rs

use std::path::PathBuf;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::paths::relative_str;
use crate::watch::patterns::WatchProfile;

/// Keeps the `RecommendedWatcher` and its forwarding task alive.
/// Dropping (or [`WatcherHandle::stop`]) stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    forward: JoinHandle<()>,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

impl WatcherHandle {
    pub fn stop(self) {
        self.forward.abort();
        info!("file watcher stopped");
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.forward.abort();
    }
}

/// Watch `root` recursively and send `RuntimeEvent::FilesChanged` for
/// every create/modify/remove event whose path matches `profile`.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    profile: WatchProfile,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // No tracing context on notify's thread; fall back to stderr.
                    eprintln!("blogpipe: failed to forward file event: {err}");
                }
            }
            Err(err) => {
                eprintln!("blogpipe: file watch error: {err}");
            }
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", root))?;

    info!("file watcher started on {:?}", root);

    let forward = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if !is_content_change(&event.kind) {
                continue;
            }

            let paths: Vec<PathBuf> = event
                .paths
                .into_iter()
                .filter(|path| {
                    relative_str(&root, path)
                        .map(|rel| profile.matches(&rel))
                        .unwrap_or(false)
                })
                .collect();

            if paths.is_empty() {
                continue;
            }

            debug!(?paths, "watched files changed");
            if runtime_tx
                .send(RuntimeEvent::FilesChanged { paths })
                .await
                .is_err()
            {
                warn!("runtime channel closed; file watcher forwarding stops");
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        forward,
    })
}

/// Create, content modification, rename and remove count; access and
/// metadata-only events do not.
fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};

    #[test]
    fn content_changes_only() {
        assert!(is_content_change(&EventKind::Create(CreateKind::File)));
        assert!(is_content_change(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(!is_content_change(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_content_change(&EventKind::Access(AccessKind::Any)));
    }
}
