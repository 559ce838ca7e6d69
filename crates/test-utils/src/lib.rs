pub mod builders;
pub mod fake_executor;

use std::path::PathBuf;
use std::sync::{Arc, Once};

use blogpipe::config::ConfigFile;
use blogpipe::context::PipelineContext;
use blogpipe::engine::RuntimeEvent;
use blogpipe::fs::FileSystem;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// A context over `fs` rooted at `root`, plus the receiving end of its
/// runtime channel.
pub fn test_context(
    cfg: ConfigFile,
    root: impl Into<PathBuf>,
    fs: Arc<dyn FileSystem>,
) -> (Arc<PipelineContext>, mpsc::Receiver<RuntimeEvent>) {
    let (tx, rx) = mpsc::channel(64);
    let ctx = PipelineContext::new(Arc::new(cfg), root.into(), fs, tx);
    (Arc::new(ctx), rx)
}
