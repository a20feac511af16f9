//! Plugins used by the integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use hashbuild::exec::{Completion, Plugin, plugin_fn};
use hashbuild::task::TaskDescriptor;

/// Writes the upper-cased contents of each read to the write at the same
/// position, on a spawned task.
pub fn upper_plugin(root: PathBuf) -> impl Plugin {
    plugin_fn(move |task, done| {
        let root = root.clone();
        tokio::spawn(async move {
            match uppercase_outputs(&root, &task).await {
                Ok(()) => done.complete(),
                Err(err) => done.fail(err),
            }
        });
        Ok(())
    })
}

async fn uppercase_outputs(root: &Path, task: &TaskDescriptor) -> anyhow::Result<()> {
    for (read, write) in task.reads().iter().zip(task.writes()) {
        let input = tokio::fs::read_to_string(root.join(read))
            .await
            .with_context(|| format!("reading {read:?}"))?;
        let target = root.join(write);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, input.to_uppercase()).await?;
    }
    Ok(())
}

/// Records every task it is applied to and writes a marker into each of the
/// task's outputs before completing synchronously.
#[derive(Clone, Default)]
pub struct RecordingPlugin {
    root: PathBuf,
    requires_reads: bool,
    applied: Arc<Mutex<Vec<String>>>,
}

impl RecordingPlugin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn requiring_reads(mut self) -> Self {
        self.requires_reads = true;
        self
    }

    /// Task names this plugin was applied to, in order.
    pub fn applied(&self) -> Vec<String> {
        self.applied.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }
}

impl Plugin for RecordingPlugin {
    fn apply(&self, task: Arc<TaskDescriptor>, done: Completion) -> anyhow::Result<()> {
        self.applied.lock().unwrap().push(task.name().to_string());
        for write in task.writes() {
            let target = self.root.join(write);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&target, format!("{} output\n", task.name()))?;
        }
        done.complete();
        Ok(())
    }

    fn requires_reads(&self) -> bool {
        self.requires_reads
    }
}

/// Completes without writing anything.
pub fn noop_plugin() -> impl Plugin {
    plugin_fn(|_task, done| {
        done.complete();
        Ok(())
    })
}

/// Signals completion twice, once immediately and once from a spawned task.
pub fn double_complete_plugin() -> impl Plugin {
    plugin_fn(|_task, done| {
        done.complete();
        let again = done.clone();
        tokio::spawn(async move { again.complete() });
        Ok(())
    })
}

/// Reports failure through the completion handle.
pub fn failing_plugin(message: &'static str) -> impl Plugin {
    plugin_fn(move |_task, done| {
        done.fail(anyhow!(message));
        Ok(())
    })
}

/// Fails synchronously from `apply`.
pub fn rejecting_plugin(message: &'static str) -> impl Plugin {
    plugin_fn(move |_task, _done| Err(anyhow!(message)))
}

/// Drops its completion without ever signalling it.
pub fn abandoning_plugin() -> impl Plugin {
    plugin_fn(|_task, done| {
        drop(done);
        Ok(())
    })
}
