// src/exec/plugin.rs

//! Plugin contract and registry.
//!
//! A plugin performs the actual transformation for a task. The engine hands
//! it the task descriptor and a [`Completion`] handle; the plugin may finish
//! synchronously or move the handle into its own async work, and signals the
//! handle once when done. Only the first signal counts.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::errors::{HashbuildError, NameKind, Result};
use crate::task::{TaskDescriptor, TaskName};

/// A named, pluggable build step.
pub trait Plugin: Send + Sync {
    /// Start producing `task`'s outputs and signal `done` when finished.
    ///
    /// Returning an error is fatal for the whole run.
    fn apply(&self, task: Arc<TaskDescriptor>, done: Completion) -> anyhow::Result<()>;

    /// Whether this plugin refuses tasks that declare no reads.
    fn requires_reads(&self) -> bool {
        false
    }
}

impl<F> Plugin for F
where
    F: Fn(Arc<TaskDescriptor>, Completion) -> anyhow::Result<()> + Send + Sync,
{
    fn apply(&self, task: Arc<TaskDescriptor>, done: Completion) -> anyhow::Result<()> {
        self(task, done)
    }
}

type Signal = oneshot::Sender<anyhow::Result<()>>;

/// Single-use completion signal handed to a plugin.
///
/// Cloning is allowed so a plugin can move copies into several futures; the
/// first `complete`/`fail` across all clones wins and the rest are ignored.
#[derive(Clone)]
pub struct Completion {
    task: TaskName,
    plugin: String,
    signal: Arc<Mutex<Option<Signal>>>,
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("task", &self.task)
            .field("plugin", &self.plugin)
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Completion {
    /// Create a completion handle and the receiver the engine waits on.
    pub fn new(
        task: impl Into<TaskName>,
        plugin: impl Into<String>,
    ) -> (Self, oneshot::Receiver<anyhow::Result<()>>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            task: task.into(),
            plugin: plugin.into(),
            signal: Arc::new(Mutex::new(Some(tx))),
        };
        (completion, rx)
    }

    /// Signal successful completion.
    pub fn complete(&self) {
        self.settle(Ok(()));
    }

    /// Signal failure; the engine aborts the run with this error.
    pub fn fail(&self, err: impl Into<anyhow::Error>) {
        self.settle(Err(err.into()));
    }

    /// Whether this completion has already been signalled.
    pub fn is_settled(&self) -> bool {
        self.signal
            .lock()
            .map(|guard| guard.is_none())
            .unwrap_or(true)
    }

    fn settle(&self, result: anyhow::Result<()>) {
        let sender = self
            .signal
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        match sender {
            Some(tx) => {
                if tx.send(result).is_err() {
                    debug!(task = %self.task, plugin = %self.plugin, "completion receiver already gone");
                }
            }
            None => {
                warn!(
                    task = %self.task,
                    plugin = %self.plugin,
                    "plugin signalled completion more than once; ignoring"
                );
            }
        }
    }
}

/// Registered plugins, keyed by unique name.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Arc<dyn Plugin>>,
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.plugins.keys().collect();
        names.sort();
        f.debug_struct("PluginRegistry")
            .field("plugins", &names)
            .finish()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(HashbuildError::InvalidPlugin(
                "cannot add a plugin without a name".to_string(),
            ));
        }
        if self.plugins.contains_key(&name) {
            return Err(HashbuildError::DuplicateName {
                kind: NameKind::Plugin,
                name,
            });
        }
        debug!(plugin = %name, "registered plugin");
        self.plugins.insert(name, plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.get(name)
    }

    /// Look up a plugin, failing with `UnknownPlugin` if it is not registered.
    pub fn require(&self, name: &str) -> Result<&Arc<dyn Plugin>> {
        self.get(name)
            .ok_or_else(|| HashbuildError::UnknownPlugin(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Pin a closure to the plugin signature so its argument types are inferred.
///
/// ```
/// use hashbuild::exec::plugin_fn;
///
/// let noop = plugin_fn(|_task, done| {
///     done.complete();
///     Ok(())
/// });
/// # let _ = noop;
/// ```
pub fn plugin_fn<F>(f: F) -> F
where
    F: Fn(Arc<TaskDescriptor>, Completion) -> anyhow::Result<()> + Send + Sync,
{
    f
}
