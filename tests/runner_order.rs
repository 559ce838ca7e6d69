// tests/runner_order.rs

mod common;
use crate::common::{init_tracing, test_context};

use std::sync::Arc;

use blogpipe::config::ConfigFile;
use blogpipe::dag::TaskGraph;
use blogpipe::engine::{StepOutcome, TaskRunner};
use blogpipe::errors::PipelineError;
use blogpipe::fs::mock::MockFileSystem;
use blogpipe::types::StepKind;
use blogpipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use blogpipe_test_utils::fake_executor::FakeExecutor;

fn runner_for(cfg: &ConfigFile, fake: &Arc<FakeExecutor>) -> TaskRunner {
    TaskRunner::new(TaskGraph::from_config(cfg), Arc::clone(fake) as _)
}

#[tokio::test]
async fn default_pipeline_runs_predecessors_in_order() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let fake = Arc::new(FakeExecutor::new());
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    let report = runner.run(&ctx, "default").await.unwrap();

    assert!(report.succeeded());
    // The group itself has no body and never reaches the executor.
    assert_eq!(
        fake.executed(),
        vec!["clean", "bundle", "generate", "serve", "watch"]
    );
    assert_eq!(
        report.executed_names(),
        vec!["clean", "bundle", "generate", "serve", "watch", "default"]
    );
    assert_eq!(fake.max_in_flight(), 1);
}

#[tokio::test]
async fn failing_generate_never_reaches_reload() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let fake = Arc::new(FakeExecutor::new().failing("generate", 3));
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    let report = runner.run(&ctx, "reload").await.unwrap();

    assert!(!report.succeeded());
    assert_eq!(report.failed.as_deref(), Some("generate"));
    assert_eq!(
        report.executed,
        vec![
            ("bundle".to_string(), StepOutcome::Success),
            ("generate".to_string(), StepOutcome::Failed(3)),
        ]
    );
    assert_eq!(report.skipped, vec!["reload"]);
    assert_eq!(fake.count_of("reload"), 0);
}

#[tokio::test]
async fn executor_error_is_a_failure() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let fake = Arc::new(FakeExecutor::new().erroring("bundle"));
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    let report = runner.run(&ctx, "generate").await.unwrap();

    assert_eq!(report.failed.as_deref(), Some("bundle"));
    assert_eq!(report.executed, vec![("bundle".to_string(), StepOutcome::Failed(-1))]);
    assert_eq!(fake.executed(), vec!["bundle"]);
}

#[tokio::test]
async fn shared_predecessor_runs_once_per_run() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("prep", TaskConfigBuilder::command("true").build())
        .with_task("left", TaskConfigBuilder::command("true").after("prep").build())
        .with_task("right", TaskConfigBuilder::command("true").after("prep").build())
        .with_task(
            "all",
            TaskConfigBuilder::new(StepKind::Group)
                .after("right")
                .after("left")
                .build(),
        )
        .build();
    let fake = Arc::new(FakeExecutor::new());
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    runner.run(&ctx, "all").await.unwrap();

    assert_eq!(fake.executed(), vec!["prep", "right", "left"]);
}

#[tokio::test]
async fn unknown_task_is_an_error() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let fake = Arc::new(FakeExecutor::new());
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    let err = runner.run(&ctx, "deploy").await.unwrap_err();

    assert!(matches!(err, PipelineError::TaskNotFound(ref name) if name == "deploy"));
    assert!(fake.executed().is_empty());
}

#[tokio::test]
async fn standalone_step_runs_alone_and_run_ids_increase() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let fake = Arc::new(FakeExecutor::new());
    let runner = runner_for(&cfg, &fake);
    let (ctx, _rx) = test_context(cfg, "/site", Arc::new(MockFileSystem::new()));

    let first = runner.run_standalone(&ctx, StepKind::Generate).await;
    let second = runner.run(&ctx, "clean").await.unwrap();

    assert_eq!(fake.executed(), vec!["generate", "clean"]);
    assert!(second.run_id > first.run_id);
}
