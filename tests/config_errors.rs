// tests/config_errors.rs

use std::path::PathBuf;

use blogpipe::config::{ConfigFile, load_for_cli, load_from_str};
use blogpipe::errors::PipelineError;
use blogpipe::types::StepKind;
use blogpipe_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};

fn validate(toml: &str) -> Result<ConfigFile, PipelineError> {
    ConfigFile::try_from(load_from_str(toml)?)
}

#[test]
fn empty_file_gives_built_in_pipeline() {
    let cfg = validate("").unwrap();

    let names: Vec<&str> = cfg.tasks().keys().map(|s| s.as_str()).collect();
    assert_eq!(
        names,
        vec!["bundle", "clean", "default", "generate", "reload", "serve", "watch"]
    );
    assert_eq!(cfg.bundle().output, PathBuf::from("js/main.min.js"));
    assert_eq!(cfg.serve().port, 3000);
    assert_eq!(cfg.watch().run, "reload");
}

#[test]
fn sections_and_tasks_parse() {
    let cfg = validate(
        r#"
        [site]
        output = "public"

        [bundle]
        include = ["assets/js/**/*.js"]
        output = "assets/app.js"
        minify = false

        [generate]
        cmd = "bundle exec jekyll build"

        [task.build]
        kind = "generate"
        after = ["js"]

        [task.js]
        kind = "bundle"

        [task.lint]
        kind = "command"
        cmd = "eslint js"
        "#,
    )
    .unwrap();

    assert_eq!(cfg.site().output, PathBuf::from("public"));
    assert!(!cfg.bundle().minify);
    assert_eq!(cfg.tasks()["build"].kind, StepKind::Generate);
    assert_eq!(cfg.tasks()["build"].after, vec!["js"]);
    assert_eq!(cfg.tasks()["lint"].cmd.as_deref(), Some("eslint js"));
    // Explicit tasks replace the built-in graph entirely.
    assert!(!cfg.tasks().contains_key("default"));
}

#[test]
fn cycle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new(StepKind::Bundle).after("b").build())
        .with_task("b", TaskConfigBuilder::new(StepKind::Generate).after("a").build())
        .try_build()
        .unwrap_err();

    assert!(matches!(err, PipelineError::DagCycle(_)));
}

#[test]
fn unknown_dependency_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("generate", TaskConfigBuilder::new(StepKind::Generate).after("bundel").build())
        .try_build()
        .unwrap_err();

    match err {
        PipelineError::ConfigError(msg) => assert!(msg.contains("unknown dependency 'bundel'")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn self_dependency_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::new(StepKind::Clean).after("a").build())
        .try_build()
        .unwrap_err();

    assert!(matches!(err, PipelineError::ConfigError(_)));
}

#[test]
fn command_task_needs_cmd() {
    let err = ConfigFileBuilder::new()
        .with_task("lint", TaskConfigBuilder::new(StepKind::Command).build())
        .try_build()
        .unwrap_err();

    assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("no `cmd`")));
}

#[test]
fn watch_run_must_name_a_rebuildable_task() {
    let missing = ConfigFileBuilder::new()
        .with_task("watch", TaskConfigBuilder::new(StepKind::Watch).build())
        .with_watch_run("rebuild")
        .try_build()
        .unwrap_err();
    assert!(matches!(missing, PipelineError::ConfigError(msg) if msg.contains("unknown task 'rebuild'")));

    let recursive = ConfigFileBuilder::new()
        .with_task("watch", TaskConfigBuilder::new(StepKind::Watch).build())
        .with_watch_run("watch")
        .try_build()
        .unwrap_err();
    assert!(matches!(recursive, PipelineError::ConfigError(_)));
}

#[test]
fn unknown_kind_is_a_toml_error() {
    let err = validate(
        r#"
        [task.x]
        kind = "compile"
        "#,
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::TomlError(_)));
}

#[test]
fn zero_port_retries_rejected() {
    let err = validate("[serve]\nport_retries = 0\n").unwrap_err();
    assert!(matches!(err, PipelineError::ConfigError(_)));
}

#[test]
fn explicit_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.toml");

    let err = load_for_cli(Some(&path)).unwrap_err();

    assert!(matches!(err, PipelineError::ConfigError(msg) if msg.contains("does not exist")));
}

#[test]
fn explicit_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Blogpipe.toml");
    std::fs::write(&path, "[generate]\ncmd = \"hugo\"\n").unwrap();

    let (cfg, used) = load_for_cli(Some(&path)).unwrap();

    assert_eq!(cfg.generate().cmd, "hugo");
    assert_eq!(used, Some(path));
}

#[test]
fn unreadable_config_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();

    // A directory exists but cannot be read as a file.
    let err = load_for_cli(Some(dir.path())).unwrap_err();

    assert!(matches!(err, PipelineError::IoError(_)));
}
