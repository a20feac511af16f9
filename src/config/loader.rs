// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::engine::{EngineConfig, Orchestrator};
use crate::errors::Result;
use crate::exec::CommandPlugin;
use crate::task::TaskDescriptor;

/// Load a build file and return the raw, unvalidated `RawConfigFile`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    parse_str(&contents)
}

/// Parse build file contents.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a build file from path and validate it.
///
/// This is the recommended entry point: reads TOML, applies defaults and
/// checks `pool_size`, plugin commands and every task/plugin reference.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Default build file location.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Hashbuild.toml")
}

/// Project root for a build file: its directory, or the current directory
/// for a bare file name.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

impl ConfigFile {
    /// Engine settings for a project rooted at `root`.
    pub fn engine_config(&self, root: impl Into<PathBuf>) -> EngineConfig {
        EngineConfig::new(root)
            .with_cache_dir(&self.config.cache_directory)
            .with_pool_size(self.config.pool_size)
            .with_tolerate_missing_outputs(self.config.tolerate_missing_outputs)
            .with_reuse_digests(self.config.reuse_digests)
    }

    /// Register every plugin, then every task, into `orchestrator`.
    pub fn register_into(&self, orchestrator: &mut Orchestrator) -> Result<()> {
        let root = orchestrator.root().to_path_buf();

        for (name, plugin) in self.plugin.iter() {
            let command = CommandPlugin::new(name, &plugin.cmd, &root)
                .with_requires_reads(plugin.requires_reads);
            orchestrator.register_shared_plugin(name, Arc::new(command))?;
        }

        for (name, task) in self.task.iter() {
            let mut builder = TaskDescriptor::builder(name)
                .reads(&task.reads)
                .writes(&task.writes);
            for dep in &task.before {
                builder = builder.before(dep);
            }
            for dep in &task.after {
                builder = builder.after(dep);
            }
            for plugin in &task.plugins {
                builder = builder.plugin(plugin);
            }
            if let Some(options) = &task.options {
                builder = builder.options(options.clone());
            }
            orchestrator.register_task(builder.build())?;
        }

        Ok(())
    }

    /// Build an orchestrator rooted at `root` with everything registered.
    pub fn into_orchestrator(&self, root: impl Into<PathBuf>) -> Result<Orchestrator> {
        let mut orchestrator = Orchestrator::new(self.engine_config(root))?;
        self.register_into(&mut orchestrator)?;
        Ok(orchestrator)
    }
}
