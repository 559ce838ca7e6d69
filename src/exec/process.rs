// src/exec/process.rs

//! Child process runner for `generate` and `command` steps.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

/// Run `cmd` through the platform shell in `cwd` and wait for it to exit.
///
/// stdin/stdout/stderr are inherited so the generator's own output reaches
/// the terminal unchanged. Returns the exit code (`-1` when the process was
/// killed by a signal). Failing to spawn is an `Err`.
///
/// The child is killed if the returned future is dropped before it exits,
/// so a process never outlives the step that started it.
pub async fn run_command(task: &str, cmd: &str, cwd: &Path) -> Result<i32> {
    info!(task = %task, cmd = %cmd, cwd = ?cwd, "starting process");

    // Build a shell command appropriate for the platform.
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    };

    command
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of task '{}'", task))?;

    let code = status.code().unwrap_or(-1);
    info!(
        task = %task,
        exit_code = code,
        success = status.success(),
        "process exited"
    );

    Ok(code)
}
