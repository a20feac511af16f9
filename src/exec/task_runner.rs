// src/exec/task_runner.rs

//! Runs one task: digest, restore-or-build, save.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{CacheStore, ContentHasher, FileDigest, task_digest};
use crate::engine::TaskOutcome;
use crate::errors::{HashbuildError, Result};
use crate::exec::plugin::{Completion, PluginRegistry};
use crate::task::TaskDescriptor;

/// Everything a task needs while it runs. Shared by all tasks of a drain.
#[derive(Debug)]
pub struct RunContext {
    pub hasher: Arc<ContentHasher>,
    pub store: CacheStore,
    pub plugins: PluginRegistry,
    /// Log unproduced outputs at debug instead of warn.
    pub tolerate_missing_outputs: bool,
}

/// Bring `task`'s outputs up to date.
///
/// 1. digest the task from its name, options, plugins and inputs;
/// 2. a task without outputs is satisfied as is; otherwise try to restore
///    every output from the cache entry for that digest;
/// 3. on a miss, run the plugin chain in order;
/// 4. save whatever outputs were produced under the digest.
pub async fn run_task(ctx: &RunContext, task: Arc<TaskDescriptor>) -> Result<TaskOutcome> {
    let name = task.name();

    let inputs: Vec<FileDigest> =
        join_all(task.reads().iter().map(|path| ctx.hasher.digest_of(path))).await;
    let key = task_digest(&task, &inputs)?;

    debug!(
        task = %name,
        key = %key,
        absent_inputs = inputs.iter().filter(|d| d.is_absent()).count(),
        "computed task digest"
    );

    if task.writes().is_empty() {
        info!(task = %name, "[{name}] done");
        return Ok(TaskOutcome::NoOutputs);
    }

    let restored = ctx.store.restore(&key, task.writes()).await;
    invalidate_outputs(ctx, &task);

    if restored.iter().all(|ok| *ok) {
        info!(task = %name, key = %key, "[{name}] skip");
        return Ok(TaskOutcome::Skipped);
    }

    run_plugin_chain(ctx, &task).await?;
    invalidate_outputs(ctx, &task);

    let saved = ctx.store.save(&key, task.writes()).await;
    let missing: Vec<PathBuf> = task
        .writes()
        .iter()
        .zip(&saved)
        .filter(|(_, ok)| !**ok)
        .map(|(path, _)| path.clone())
        .collect();

    for path in &missing {
        if ctx.tolerate_missing_outputs {
            debug!(task = %name, path = ?path, "[{name}] missing expected output {path:?}");
        } else {
            warn!(task = %name, path = ?path, "[{name}] missing expected output {path:?}");
        }
    }

    info!(task = %name, key = %key, "[{name}] done");
    Ok(TaskOutcome::Built { missing })
}

/// Apply each plugin in turn, waiting for its completion before the next.
async fn run_plugin_chain(ctx: &RunContext, task: &Arc<TaskDescriptor>) -> Result<()> {
    for plugin_name in task.plugins() {
        let plugin = ctx.plugins.require(plugin_name)?;

        if plugin.requires_reads() && task.reads().is_empty() {
            return Err(HashbuildError::MissingReads {
                task: task.name().to_string(),
                plugin: plugin_name.clone(),
            });
        }

        debug!(task = %task.name(), plugin = %plugin_name, "applying plugin");

        let (done, signal) = Completion::new(task.name(), plugin_name.as_str());
        plugin
            .apply(Arc::clone(task), done)
            .map_err(|source| HashbuildError::PluginFailed {
                task: task.name().to_string(),
                plugin: plugin_name.clone(),
                source,
            })?;

        match signal.await {
            Ok(Ok(())) => {
                debug!(task = %task.name(), plugin = %plugin_name, "plugin completed");
            }
            Ok(Err(source)) => {
                return Err(HashbuildError::PluginFailed {
                    task: task.name().to_string(),
                    plugin: plugin_name.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(HashbuildError::PluginAbandoned {
                    task: task.name().to_string(),
                    plugin: plugin_name.clone(),
                });
            }
        }
    }
    Ok(())
}

// Outputs were just rewritten; later readers in this drain must re-hash them.
fn invalidate_outputs(ctx: &RunContext, task: &TaskDescriptor) {
    for path in task.writes() {
        ctx.hasher.invalidate(path);
    }
}
