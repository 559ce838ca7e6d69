// src/context.rs

//! Process-wide state shared by every step of a pipeline invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tracing::info;

use crate::config::ConfigFile;
use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::serve::{ReloadHub, ServerHandle};
use crate::watch::WatcherHandle;

/// Created once per process and passed by reference into every step.
///
/// Holds the two long-lived resources a run can start (the dev server and
/// the file watcher) so later steps can find them and shutdown can release
/// them.
pub struct PipelineContext {
    config: Arc<ConfigFile>,
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    event_tx: mpsc::Sender<RuntimeEvent>,
    server: Mutex<Option<ServerHandle>>,
    watcher: Mutex<Option<WatcherHandle>>,
}

impl fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineContext")
            .field("root", &self.root)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl PipelineContext {
    pub fn new(
        config: Arc<ConfigFile>,
        root: PathBuf,
        fs: Arc<dyn FileSystem>,
        event_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            config,
            root,
            fs,
            event_tx,
            server: Mutex::new(None),
            watcher: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Project root; every configured relative path is resolved against it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Directory the generator writes and the server serves.
    pub fn site_dir(&self) -> PathBuf {
        self.root.join(&self.config.site().output)
    }

    pub fn event_sender(&self) -> mpsc::Sender<RuntimeEvent> {
        self.event_tx.clone()
    }

    pub async fn has_server(&self) -> bool {
        self.server.lock().await.is_some()
    }

    pub async fn has_watcher(&self) -> bool {
        self.watcher.lock().await.is_some()
    }

    /// True when something is left running after the initial run.
    pub async fn has_long_lived(&self) -> bool {
        self.has_server().await || self.has_watcher().await
    }

    /// The in-process server's reload hub, if a server is running.
    pub async fn reload_hub(&self) -> Option<ReloadHub> {
        self.server.lock().await.as_ref().map(|s| s.hub().clone())
    }

    pub async fn install_server(&self, handle: ServerHandle) {
        *self.server.lock().await = Some(handle);
    }

    pub async fn install_watcher(&self, handle: WatcherHandle) {
        *self.watcher.lock().await = Some(handle);
    }

    /// Stop the watcher first (no new rebuilds), then the server.
    pub async fn shutdown(&self) {
        let watcher = self.watcher.lock().await.take();
        if let Some(watcher) = watcher {
            watcher.stop();
        }

        let server = self.server.lock().await.take();
        if let Some(server) = server {
            server.shutdown().await;
        }

        info!("pipeline context released");
    }
}
