#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use hashbuild::config::{ConfigFile, ConfigSection, PluginConfig, RawConfigFile, TaskConfig};
use hashbuild::engine::{EngineConfig, Orchestrator};
use serde_json::Value;
use tempfile::TempDir;

/// A throwaway project directory with its own cache.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp project"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent dir");
        }
        fs::write(path, contents).expect("failed to write project file");
    }

    pub fn read(&self, rel: &str) -> Option<String> {
        fs::read_to_string(self.path(rel)).ok()
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).expect("failed to remove project file");
    }

    /// Engine settings rooted at this project.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.root())
    }

    /// A fresh orchestrator over this project's root and cache.
    pub fn orchestrator(&self, pool_size: usize) -> Orchestrator {
        Orchestrator::new(self.engine_config().with_pool_size(pool_size))
            .expect("failed to create orchestrator")
    }

    /// Number of task-digest directories in the default cache.
    pub fn cache_entries(&self) -> usize {
        match fs::read_dir(self.path(".hashbuild")) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_dir())
                .count(),
            Err(_) => 0,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                plugin: BTreeMap::new(),
                task: BTreeMap::new(),
            },
        }
    }

    pub fn with_plugin(mut self, name: &str, cmd: &str) -> Self {
        self.config.plugin.insert(
            name.to_string(),
            PluginConfig {
                cmd: cmd.to_string(),
                requires_reads: false,
            },
        );
        self
    }

    pub fn with_task(mut self, name: &str, task: TaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.config.config.pool_size = pool_size;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new() -> Self {
        Self {
            task: TaskConfig::default(),
        }
    }

    pub fn read(mut self, path: &str) -> Self {
        self.task.reads.push(path.to_string());
        self
    }

    pub fn write(mut self, path: &str) -> Self {
        self.task.writes.push(path.to_string());
        self
    }

    pub fn before(mut self, dep: &str) -> Self {
        self.task.before.push(dep.to_string());
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn plugin(mut self, name: &str) -> Self {
        self.task.plugins.push(name.to_string());
        self
    }

    pub fn options(mut self, options: Value) -> Self {
        self.task.options = Some(options);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}

impl Default for TaskConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
