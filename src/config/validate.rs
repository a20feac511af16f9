// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{HashbuildError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = HashbuildError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.plugin, raw.task))
    }
}

/// Run every check on a raw build file.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_plugins(cfg)?;
    validate_task_references(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.pool_size == 0 {
        return Err(HashbuildError::ConfigError(
            "[config].pool_size must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.config.cache_directory.trim().is_empty() {
        return Err(HashbuildError::ConfigError(
            "[config].cache_directory must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_plugins(cfg: &RawConfigFile) -> Result<()> {
    for (name, plugin) in cfg.plugin.iter() {
        if plugin.cmd.trim().is_empty() {
            return Err(HashbuildError::ConfigError(format!(
                "plugin '{}' has an empty `cmd`",
                name
            )));
        }
    }
    Ok(())
}

fn validate_task_references(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        for (field, deps) in [("before", &task.before), ("after", &task.after)] {
            for dep in deps {
                if !cfg.task.contains_key(dep) {
                    return Err(HashbuildError::ConfigError(format!(
                        "task '{}' has unknown task '{}' in `{}`",
                        name, dep, field
                    )));
                }
            }
        }

        for plugin in task.plugins.iter() {
            if !cfg.plugin.contains_key(plugin) {
                return Err(HashbuildError::ConfigError(format!(
                    "task '{}' uses unknown plugin '{}'",
                    name, plugin
                )));
            }
        }
    }
    Ok(())
}
