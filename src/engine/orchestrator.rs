// src/engine/orchestrator.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cache::store::DEFAULT_CACHE_DIR;
use crate::cache::{CacheStore, ContentHasher};
use crate::dag::{Closure, Scheduler};
use crate::engine::report::DrainReport;
use crate::engine::runtime::Runtime;
use crate::errors::{HashbuildError, Result};
use crate::exec::{CachingExecutor, Plugin, PluginRegistry, RunContext, TaskExecutor};
use crate::task::{TaskDescriptor, TaskName, TaskRegistry};

/// Engine settings for one [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory that task paths are resolved against.
    pub root: PathBuf,
    /// Cache directory; relative paths are taken relative to `root`.
    pub cache_dir: PathBuf,
    /// Maximum number of tasks running at once.
    pub pool_size: usize,
    /// Report unproduced outputs at debug level instead of warning.
    pub tolerate_missing_outputs: bool,
    /// Keep memoized file digests from one drain to the next.
    pub reuse_digests: bool,
}

impl EngineConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            pool_size: 1,
            tolerate_missing_outputs: false,
            reuse_digests: false,
        }
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_tolerate_missing_outputs(mut self, tolerate: bool) -> Self {
        self.tolerate_missing_outputs = tolerate;
        self
    }

    pub fn with_reuse_digests(mut self, reuse: bool) -> Self {
        self.reuse_digests = reuse;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

/// One build invocation: registries, scheduled roots, hasher and cache.
///
/// Nothing here is global, so independent orchestrators (e.g. in tests)
/// never see each other's tasks or digests.
#[derive(Debug)]
pub struct Orchestrator {
    config: EngineConfig,
    tasks: TaskRegistry,
    plugins: PluginRegistry,
    scheduled: Vec<TaskName>,
    hasher: Arc<ContentHasher>,
    store: CacheStore,
}

impl Orchestrator {
    /// Create an orchestrator, creating the cache directory if needed.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let store = CacheStore::open(&config.root, &config.cache_dir)?;
        let hasher = Arc::new(ContentHasher::new(&config.root));

        info!(root = ?config.root, cache = ?store.dir(), "orchestrator ready");

        Ok(Self {
            config,
            tasks: TaskRegistry::new(),
            plugins: PluginRegistry::new(),
            scheduled: Vec::new(),
            hasher,
            store,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn tasks(&self) -> &TaskRegistry {
        &self.tasks
    }

    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    pub fn hasher(&self) -> &ContentHasher {
        &self.hasher
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Roots of the next drain, in scheduling order.
    pub fn scheduled(&self) -> &[TaskName] {
        &self.scheduled
    }

    /// Change the pool size for subsequent drains.
    pub fn set_pool_size(&mut self, pool_size: usize) {
        self.config.pool_size = pool_size;
    }

    pub fn register_task(&mut self, task: TaskDescriptor) -> Result<()> {
        self.tasks.register(task)
    }

    pub fn register_plugin(&mut self, name: impl Into<String>, plugin: impl Plugin + 'static) -> Result<()> {
        self.plugins.register(name, Arc::new(plugin))
    }

    pub fn register_shared_plugin(&mut self, name: impl Into<String>, plugin: Arc<dyn Plugin>) -> Result<()> {
        self.plugins.register(name, plugin)
    }

    /// Mark `name` as a root of the next drain.
    pub fn schedule_task(&mut self, name: &str) -> Result<()> {
        if !self.tasks.contains(name) {
            return Err(HashbuildError::UnknownTask(name.to_string()));
        }
        if !self.scheduled.iter().any(|n| n == name) {
            debug!(task = %name, "scheduled task");
            self.scheduled.push(name.to_string());
        }
        Ok(())
    }

    /// Resolve the closure of the currently scheduled roots without running
    /// anything.
    pub fn plan(&self) -> Result<Closure> {
        Closure::build(&self.tasks, &self.scheduled)
    }

    /// Run every scheduled task (and everything it needs) to completion.
    ///
    /// The scheduled roots are consumed even if the drain fails.
    pub async fn drain(&mut self) -> Result<DrainReport> {
        let executor = CachingExecutor::new(RunContext {
            hasher: Arc::clone(&self.hasher),
            store: self.store.clone(),
            plugins: self.plugins.clone(),
            tolerate_missing_outputs: self.config.tolerate_missing_outputs,
        });
        self.drain_with(Arc::new(executor)).await
    }

    /// Like [`drain`](Self::drain) but with a caller-supplied executor.
    pub async fn drain_with(&mut self, executor: Arc<dyn TaskExecutor>) -> Result<DrainReport> {
        let roots = std::mem::take(&mut self.scheduled);
        let closure = Closure::build(&self.tasks, &roots)?;

        if !self.config.reuse_digests {
            self.hasher.reset();
        }

        let cycles = closure.cycles().to_vec();
        let scheduler = Scheduler::new(closure, self.config.pool_size);

        Runtime::new(scheduler, executor)
            .with_cycles(cycles)
            .run()
            .await
    }

    /// Schedule `names` and drain.
    pub async fn run_tasks<I, S>(&mut self, names: I) -> Result<DrainReport>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.schedule_task(name.as_ref())?;
        }
        self.drain().await
    }
}
