// src/exec/command.rs

//! Built-in plugin that runs a shell command.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::exec::plugin::{Completion, Plugin};
use crate::task::TaskDescriptor;

/// Runs `cmd` through the platform shell in the project root.
///
/// The command sees the task through environment variables:
/// - `HASHBUILD_TASK`: task name
/// - `HASHBUILD_READS` / `HASHBUILD_WRITES`: space-joined paths
/// - `HASHBUILD_OPTIONS`: the task options as JSON
#[derive(Debug, Clone)]
pub struct CommandPlugin {
    name: String,
    cmd: String,
    root: PathBuf,
    requires_reads: bool,
}

impl CommandPlugin {
    pub fn new(name: impl Into<String>, cmd: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            root: root.into(),
            requires_reads: false,
        }
    }

    pub fn with_requires_reads(mut self, requires_reads: bool) -> Self {
        self.requires_reads = requires_reads;
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn build_command(&self, task: &TaskDescriptor) -> Result<Command> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        let options = serde_json::to_string(task.options())
            .with_context(|| format!("serializing options of task '{}'", task.name()))?;

        cmd.current_dir(&self.root)
            .env("HASHBUILD_TASK", task.name())
            .env("HASHBUILD_READS", join_paths(task.reads()))
            .env("HASHBUILD_WRITES", join_paths(task.writes()))
            .env("HASHBUILD_OPTIONS", options)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        Ok(cmd)
    }
}

impl Plugin for CommandPlugin {
    fn apply(&self, task: Arc<TaskDescriptor>, done: Completion) -> Result<()> {
        let mut cmd = self.build_command(&task)?;
        let plugin = self.name.clone();
        let shell = self.cmd.clone();

        tokio::spawn(async move {
            match run_command(&mut cmd, &task, &plugin, &shell).await {
                Ok(()) => done.complete(),
                Err(err) => done.fail(err),
            }
        });

        Ok(())
    }

    fn requires_reads(&self) -> bool {
        self.requires_reads
    }
}

async fn run_command(
    cmd: &mut Command,
    task: &TaskDescriptor,
    plugin: &str,
    shell: &str,
) -> Result<()> {
    info!(task = %task.name(), plugin = %plugin, cmd = %shell, "starting plugin command");

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{shell}' for task '{}'", task.name()))?;

    if let Some(stdout) = child.stdout.take() {
        forward_lines(task.name().to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(task.name().to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for '{shell}' of task '{}'", task.name()))?;

    debug!(
        task = %task.name(),
        plugin = %plugin,
        exit_code = status.code().unwrap_or(-1),
        "plugin command exited"
    );

    if !status.success() {
        bail!(
            "command '{shell}' exited with code {}",
            status.code().unwrap_or(-1)
        );
    }
    Ok(())
}

// Always drain the pipes so the child never blocks on a full buffer.
fn forward_lines<R>(task: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, "{stream}: {line}");
        }
    });
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}
