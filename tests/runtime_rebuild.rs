// tests/runtime_rebuild.rs

mod common;
use crate::common::{init_tracing, test_context, with_timeout};

use std::path::PathBuf;
use std::sync::Arc;

use tokio::time::{Duration, sleep};

use blogpipe::config::ConfigFile;
use blogpipe::dag::TaskGraph;
use blogpipe::engine::{Runtime, RuntimeEvent, RuntimeStats, TaskRunner};
use blogpipe::fs::mock::MockFileSystem;
use blogpipe_test_utils::builders::ConfigFileBuilder;
use blogpipe_test_utils::fake_executor::FakeExecutor;

const DEBOUNCE: Duration = Duration::from_millis(20);

fn changed(path: &str) -> RuntimeEvent {
    RuntimeEvent::FilesChanged {
        paths: vec![PathBuf::from(path)],
    }
}

async fn wait_for(fake: &FakeExecutor, name: &str, count: usize) {
    with_timeout(async {
        while fake.count_of(name) < count {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

struct Harness {
    fake: Arc<FakeExecutor>,
    tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    join: tokio::task::JoinHandle<RuntimeStats>,
}

fn start(cfg: ConfigFile, fake: FakeExecutor) -> Harness {
    let fake = Arc::new(fake);
    let runner = Arc::new(TaskRunner::new(
        TaskGraph::from_config(&cfg),
        Arc::clone(&fake) as _,
    ));
    let target = cfg.watch().run.clone();
    let (ctx, rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));
    let tx = ctx.event_sender();

    let runtime = Runtime::new(runner, ctx, rx, target, DEBOUNCE);
    let join = tokio::spawn(runtime.run());

    Harness { fake, tx, join }
}

#[tokio::test]
async fn changes_during_a_rebuild_coalesce_into_one_follow_up() {
    init_tracing();
    let h = start(
        ConfigFileBuilder::new().build(),
        FakeExecutor::new().with_delay(Duration::from_millis(40)),
    );

    h.tx.send(changed("js/a.js")).await.unwrap();
    wait_for(&h.fake, "bundle", 1).await;

    // First rebuild is busy; these all land in one pending batch.
    h.tx.send(changed("js/a.js")).await.unwrap();
    h.tx.send(changed("js/b.js")).await.unwrap();
    h.tx.send(changed("_posts/hello.md")).await.unwrap();

    wait_for(&h.fake, "reload", 2).await;
    sleep(Duration::from_millis(200)).await;

    h.tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let stats = with_timeout(h.join).await.unwrap();

    assert_eq!(stats.rebuilds, 2);
    assert_eq!(h.fake.count_of("bundle"), 2);
    assert_eq!(
        h.fake.executed(),
        vec!["bundle", "generate", "reload", "bundle", "generate", "reload"]
    );
    assert_eq!(h.fake.max_in_flight(), 1);
}

#[tokio::test]
async fn burst_before_debounce_is_one_rebuild() {
    init_tracing();
    let h = start(ConfigFileBuilder::new().build(), FakeExecutor::new());

    for path in ["js/a.js", "js/b.js", "js/c.js", "index.html"] {
        h.tx.send(changed(path)).await.unwrap();
    }

    wait_for(&h.fake, "reload", 1).await;
    sleep(Duration::from_millis(100)).await;

    h.tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let stats = with_timeout(h.join).await.unwrap();

    assert_eq!(stats.rebuilds, 1);
    assert_eq!(h.fake.count_of("bundle"), 1);
}

#[tokio::test]
async fn failed_rebuild_keeps_watching() {
    init_tracing();
    let h = start(
        ConfigFileBuilder::new().build(),
        FakeExecutor::new().failing("generate", 1),
    );

    h.tx.send(changed("_posts/a.md")).await.unwrap();
    wait_for(&h.fake, "generate", 1).await;
    sleep(Duration::from_millis(50)).await;

    h.tx.send(changed("_posts/b.md")).await.unwrap();
    wait_for(&h.fake, "generate", 2).await;
    sleep(Duration::from_millis(50)).await;

    h.tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let stats = with_timeout(h.join).await.unwrap();

    assert_eq!(stats, RuntimeStats { rebuilds: 2, failed: 2 });
    assert_eq!(h.fake.count_of("reload"), 0);
}

#[tokio::test]
async fn shutdown_while_idle_exits_without_rebuilding() {
    init_tracing();
    let h = start(ConfigFileBuilder::new().build(), FakeExecutor::new());

    h.tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();
    let stats = with_timeout(h.join).await.unwrap();

    assert_eq!(stats, RuntimeStats::default());
    assert!(h.fake.executed().is_empty());
}

#[tokio::test]
async fn shutdown_interrupts_a_running_rebuild() {
    init_tracing();
    let h = start(
        ConfigFileBuilder::new().build(),
        FakeExecutor::new().with_delay(Duration::from_millis(300)),
    );

    h.tx.send(changed("js/a.js")).await.unwrap();
    wait_for(&h.fake, "bundle", 1).await;
    h.tx.send(RuntimeEvent::ShutdownRequested).await.unwrap();

    let stats = with_timeout(h.join).await.unwrap();

    assert_eq!(stats.rebuilds, 0);
    assert_eq!(h.fake.executed(), vec!["bundle"]);
}
