// src/serve/mod.rs

//! Local HTTP server for the generated site, with live reload.
//!
//! - [`files`] resolves request paths against the site directory.
//! - [`reload`] owns the live-reload WebSocket and the [`ReloadHub`].

pub mod files;
pub mod reload;

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum::routing::get;
use regex::Regex;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServeSection;

pub use reload::{RELOAD_COMMAND, RELOAD_PATH, ReloadHub, notify_remote, notify_running_server};

pub(crate) const BODY_CLOSE_PATTERN: &str = r"(?i)</body\s*>";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Shared state behind every request handler.
pub(crate) struct ServeState {
    pub(crate) site_dir: PathBuf,
    pub(crate) hub: ReloadHub,
    pub(crate) inject_reload_script: bool,
    pub(crate) body_close: Regex,
}

/// A running server. Dropping it also stops the server, but without
/// waiting for the listener to be released.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    hub: ReloadHub,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// The address actually bound (after port retries).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hub(&self) -> &ReloadHub {
        &self.hub
    }

    /// Stop accepting connections and wait for the listener to close.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut join) = self.join.take() {
            // Open live-reload sockets can hold graceful shutdown forever.
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut join).await.is_err() {
                warn!(addr = %self.addr, "server did not stop in time; aborting");
                join.abort();
            }
        }
        info!(addr = %self.addr, "server stopped");
    }
}

/// Build the router: live-reload socket plus static files for everything
/// else.
pub fn router(site_dir: PathBuf, hub: ReloadHub, inject_reload_script: bool) -> Result<Router> {
    let state = Arc::new(ServeState {
        site_dir,
        hub,
        inject_reload_script,
        body_close: Regex::new(BODY_CLOSE_PATTERN)?,
    });

    Ok(Router::new()
        .route(RELOAD_PATH, get(reload::ws_reload))
        .fallback(files::serve_path)
        .with_state(state))
}

/// Bind `host:port` (trying successive ports while they are taken) and
/// serve `site_dir` in the background.
pub async fn start_server(cfg: &ServeSection, site_dir: PathBuf) -> Result<ServerHandle> {
    let listener = bind_with_retry(&cfg.host, cfg.port, cfg.port_retries).await?;
    let addr = listener.local_addr()?;

    let hub = ReloadHub::new();
    let app = router(site_dir.clone(), hub.clone(), cfg.inject_reload_script)?;

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let join = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await;
        if let Err(err) = result {
            error!(error = %err, "server failed");
        }
    });

    info!(url = %format!("http://{addr}"), site = ?site_dir, "serving site");

    Ok(ServerHandle {
        addr,
        hub,
        shutdown_tx: Some(shutdown_tx),
        join: Some(join),
    })
}

/// Bind to `port`, moving on to `port + 1`, ... while the address is in use.
async fn bind_with_retry(host: &str, base_port: u16, max_retries: u16) -> Result<TcpListener> {
    // Port 0 lets the OS choose; retrying makes no sense.
    let attempts = if base_port == 0 { 1 } else { max_retries.max(1) };
    let mut last_err = None;

    for offset in 0..attempts {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind((host, port)).await {
            Ok(listener) => {
                if offset > 0 {
                    info!(base_port, port, "port in use, using {} instead", port);
                }
                return Ok(listener);
            }
            Err(err) if err.kind() == ErrorKind::AddrInUse => {
                last_err = Some(err);
                continue;
            }
            Err(err) => {
                return Err(err).with_context(|| format!("binding {host}:{port}"));
            }
        }
    }

    let last_port = base_port.saturating_add(attempts - 1);
    Err(anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        attempts,
        base_port,
        last_port,
        last_err.map(|e| e.to_string()).unwrap_or_default()
    ))
}
