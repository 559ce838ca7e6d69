// tests/serve_reload.rs

mod common;
use crate::common::{init_tracing, test_context, with_timeout, write_file};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use blogpipe::config::ServeSection;
use blogpipe::dag::TaskGraph;
use blogpipe::engine::TaskRunner;
use blogpipe::exec::RealStepExecutor;
use blogpipe::fs::RealFileSystem;
use blogpipe::serve::{RELOAD_PATH, notify_remote, start_server};
use blogpipe::types::StepKind;
use blogpipe_test_utils::builders::ConfigFileBuilder;

fn ephemeral() -> ServeSection {
    ServeSection {
        port: 0,
        ..ServeSection::default()
    }
}

/// Minimal HTTP/1.1 GET; returns status code and body.
async fn http_get(addr: SocketAddr, path: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8_lossy(&buf).into_owned();

    let status = text
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap();
    let body = text
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

fn generated_site() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", "<html><body><h1>Blog</h1></body></html>");
    write_file(dir.path(), "about.html", "<html><body>About</body></html>");
    write_file(dir.path(), "posts/hello/index.html", "<html><body>Hello</body></html>");
    write_file(dir.path(), "js/main.min.js", "var x=1;");
    dir
}

#[tokio::test]
async fn serves_files_indexes_and_404() {
    init_tracing();
    let site = generated_site();
    let server = start_server(&ephemeral(), site.path().to_path_buf()).await.unwrap();
    let addr = server.addr();

    let (status, body) = http_get(addr, "/").await;
    assert_eq!(status, 200);
    assert!(body.contains("<h1>Blog</h1>"));
    assert!(body.contains(RELOAD_PATH), "reload client injected");
    assert!(body.find("<script>").unwrap() < body.find("</body>").unwrap());

    let (status, body) = http_get(addr, "/posts/hello/").await;
    assert_eq!(status, 200);
    assert!(body.contains("Hello"));

    let (status, body) = http_get(addr, "/about").await;
    assert_eq!(status, 200);
    assert!(body.contains("About"));

    let (status, body) = http_get(addr, "/js/main.min.js").await;
    assert_eq!(status, 200);
    assert_eq!(body, "var x=1;");

    let (status, _) = http_get(addr, "/nope.html").await;
    assert_eq!(status, 404);

    let (status, _) = http_get(addr, "/%2e%2e/secret").await;
    assert_eq!(status, 400);

    server.shutdown().await;
}

#[tokio::test]
async fn script_injection_can_be_disabled() {
    init_tracing();
    let site = generated_site();
    let cfg = ServeSection {
        inject_reload_script: false,
        ..ephemeral()
    };
    let server = start_server(&cfg, site.path().to_path_buf()).await.unwrap();

    let (_, body) = http_get(server.addr(), "/").await;
    assert_eq!(body, "<html><body><h1>Blog</h1></body></html>");

    server.shutdown().await;
}

#[tokio::test]
async fn remote_reload_request_bumps_version_for_all_clients() {
    init_tracing();
    let site = generated_site();
    let server = start_server(&ephemeral(), site.path().to_path_buf()).await.unwrap();
    let mut browser = server.hub().subscribe();

    let version = with_timeout(notify_remote("127.0.0.1", server.addr().port()))
        .await
        .unwrap();

    assert_eq!(version, 1);
    assert_eq!(server.hub().current(), 1);
    assert_eq!(browser.recv().await.unwrap(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn remote_reload_without_server_fails() {
    init_tracing();
    // Grab a free port, then release it.
    let port = {
        let l = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        l.local_addr().unwrap().port()
    };

    assert!(notify_remote("127.0.0.1", port).await.is_err());
}

#[tokio::test]
async fn shutdown_releases_the_port() {
    init_tracing();
    let site = generated_site();
    let server = start_server(&ephemeral(), site.path().to_path_buf()).await.unwrap();
    let addr = server.addr();

    server.shutdown().await;

    let rebound = TcpListener::bind(addr).await;
    assert!(rebound.is_ok(), "port still held after shutdown");
}

#[tokio::test]
async fn serve_step_is_idempotent_and_reload_uses_in_process_hub() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "_site/index.html", "<html><body>x</body></html>");
    let cfg = ConfigFileBuilder::new().with_serve_port(0).build();
    let runner = TaskRunner::new(TaskGraph::from_config(&cfg), Arc::new(RealStepExecutor::new()));
    let (ctx, _rx) = test_context(cfg, dir.path(), Arc::new(RealFileSystem));

    assert!(runner.run_standalone(&ctx, StepKind::Serve).await.succeeded());
    assert!(runner.run_standalone(&ctx, StepKind::Serve).await.succeeded());
    let hub = ctx.reload_hub().await.unwrap();
    assert_eq!(hub.current(), 0);

    assert!(runner.run_standalone(&ctx, StepKind::Reload).await.succeeded());
    assert_eq!(hub.current(), 1);

    ctx.shutdown().await;
    assert!(!ctx.has_server().await);
}
