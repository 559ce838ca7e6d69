// src/serve/reload.rs

//! Live-reload channel between the pipeline and connected browsers.
//!
//! Every connected page holds a WebSocket to [`RELOAD_PATH`]. On connect it
//! receives the current version number; each [`ReloadHub::reload`] bumps the
//! version and pushes it to every socket, and a page seeing a new version
//! reloads itself. A client may also send the text [`RELOAD_COMMAND`] to
//! request a reload, which is how a separate `blogpipe reload` process
//! reaches a running server.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::broadcast;
use tracing::{debug, info};
use tungstenite::stream::MaybeTlsStream;

use super::ServeState;
use crate::config::ServeSection;

/// WebSocket endpoint served next to the site.
pub const RELOAD_PATH: &str = "/__blogpipe/livereload";

/// Text frame a control client sends to request a reload.
pub const RELOAD_COMMAND: &str = "reload";

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Version counter plus fan-out to connected clients. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReloadHub {
    inner: Arc<HubInner>,
}

#[derive(Debug)]
struct HubInner {
    version: AtomicU64,
    tx: broadcast::Sender<u64>,
}

impl Default for ReloadHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                version: AtomicU64::new(0),
                tx: broadcast::channel(64).0,
            }),
        }
    }

    /// Bump the version and tell every connected client. Returns the new
    /// version. No connected clients is fine.
    pub fn reload(&self) -> u64 {
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
        let clients = self.inner.tx.send(version).unwrap_or(0);
        info!(version, clients, "live reload");
        version
    }

    pub fn current(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<u64> {
        self.inner.tx.subscribe()
    }

    /// Number of sockets currently listening.
    pub fn client_count(&self) -> usize {
        self.inner.tx.receiver_count()
    }
}

pub(crate) async fn ws_reload(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServeState>>,
) -> Response {
    let hub = state.hub.clone();
    ws.on_upgrade(move |socket| handle_reload_socket(socket, hub))
}

async fn handle_reload_socket(mut socket: WebSocket, hub: ReloadHub) {
    let mut rx = hub.subscribe();

    if socket
        .send(Message::Text(hub.current().to_string().into()))
        .await
        .is_err()
    {
        return;
    }

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) if text.as_str().trim() == RELOAD_COMMAND => {
                        debug!("reload requested over live-reload socket");
                        hub.reload();
                    }
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    _ => {}
                }
            }
            next = rx.recv() => {
                match next {
                    Ok(version) => {
                        if socket
                            .send(Message::Text(version.to_string().into()))
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Ask a server running in another process to reload its clients.
///
/// Connects to `ws://host:port/__blogpipe/livereload`, sends
/// [`RELOAD_COMMAND`] and waits until the server announces a newer version.
/// Returns that version.
pub async fn notify_remote(host: &str, port: u16) -> Result<u64> {
    let url = format!("ws://{host}:{port}{RELOAD_PATH}");

    tokio::task::spawn_blocking(move || notify_blocking(&url))
        .await
        .context("live-reload notifier task failed")?
}

/// [`notify_remote`] across the ports a server started with `cfg` may have
/// ended up on. Returns the port that answered and the new version.
pub async fn notify_running_server(cfg: &ServeSection) -> Result<(u16, u64)> {
    let attempts = cfg.port_retries.max(1);
    let mut last_err = None;

    for offset in 0..attempts {
        let port = cfg.port.saturating_add(offset);
        match notify_remote(&cfg.host, port).await {
            Ok(version) => return Ok((port, version)),
            Err(err) => {
                debug!(port, error = %format!("{err:#}"), "no live-reload server on port");
                last_err = Some(err);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow!("no ports to try")))
        .with_context(|| format!("no live-reload server reachable on {}", cfg.host))
}

fn notify_blocking(url: &str) -> Result<u64> {
    let (mut socket, _response) = tungstenite::connect(url)
        .with_context(|| format!("connecting to live-reload server at {url}"))?;

    if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
        set_timeouts(stream)?;
    }

    let initial = read_version(&mut socket)?;
    socket
        .send(tungstenite::Message::text(RELOAD_COMMAND))
        .context("sending reload request")?;

    loop {
        let version = read_version(&mut socket)?;
        if version > initial {
            let _ = socket.close(None);
            debug!(version, "remote server reloaded");
            return Ok(version);
        }
    }
}

fn set_timeouts(stream: &TcpStream) -> Result<()> {
    stream.set_read_timeout(Some(NOTIFY_TIMEOUT))?;
    stream.set_write_timeout(Some(NOTIFY_TIMEOUT))?;
    Ok(())
}

fn read_version(socket: &mut tungstenite::WebSocket<MaybeTlsStream<TcpStream>>) -> Result<u64> {
    loop {
        match socket.read().context("reading from live-reload server")? {
            tungstenite::Message::Text(text) => {
                return text
                    .as_str()
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("unexpected live-reload message {:?}", text.as_str()));
            }
            tungstenite::Message::Close(_) => {
                return Err(anyhow!("live-reload server closed the connection"));
            }
            _ => continue,
        }
    }
}

/// Client script injected into served HTML pages.
pub(crate) fn client_script() -> String {
    format!(
        r#"<script>
(function(){{
  var current = null;
  var timer = null;
  function connect(){{
    var proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
    var ws = new WebSocket(proto + location.host + '{path}');
    ws.onmessage = function(event){{
      var next = Number(event && event.data || 0);
      if (!Number.isFinite(next)) return;
      if (current === null) {{ current = next; return; }}
      if (next !== current) location.reload();
    }};
    ws.onclose = function(){{
      if (timer) clearTimeout(timer);
      timer = setTimeout(connect, 600);
    }};
    ws.onerror = function(){{ try {{ ws.close(); }} catch (_) {{}} }};
  }}
  connect();
}})();
</script>"#,
        path = RELOAD_PATH
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_bumps_version_without_clients() {
        let hub = ReloadHub::new();
        assert_eq!(hub.current(), 0);
        assert_eq!(hub.reload(), 1);
        assert_eq!(hub.reload(), 2);
        assert_eq!(hub.current(), 2);
    }

    #[tokio::test]
    async fn subscribers_see_every_version() {
        let hub = ReloadHub::new();
        let mut rx = hub.subscribe();
        assert_eq!(hub.client_count(), 1);

        hub.reload();
        hub.reload();

        assert_eq!(rx.recv().await.unwrap(), 1);
        assert_eq!(rx.recv().await.unwrap(), 2);
    }

    #[test]
    fn client_script_targets_reload_path() {
        assert!(client_script().contains(RELOAD_PATH));
    }
}
