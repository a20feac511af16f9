// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Top-level build file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// cache_directory = ".hashbuild"
/// pool_size = 2
///
/// [plugin.upper]
/// cmd = "tr a-z A-Z < \"$HASHBUILD_READS\" > \"$HASHBUILD_WRITES\""
///
/// [task.compile]
/// reads = ["a.src"]
/// writes = ["a.out"]
/// plugins = ["upper"]
///
/// [task.default]
/// before = ["compile"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Engine settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Command plugins from `[plugin.<name>]`.
    #[serde(default)]
    pub plugin: BTreeMap<String, PluginConfig>,

    /// Tasks from `[task.<name>]`, keyed by task name.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,
}

/// A build file that passed validation. Construct it with
/// `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub plugin: BTreeMap<String, PluginConfig>,
    pub task: BTreeMap<String, TaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        plugin: BTreeMap<String, PluginConfig>,
        task: BTreeMap<String, TaskConfig>,
    ) -> Self {
        Self {
            config,
            plugin,
            task,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Cache directory, relative to the build file's directory.
    #[serde(default = "default_cache_directory")]
    pub cache_directory: String,

    /// Maximum number of tasks running at once.
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Log unproduced outputs at debug level instead of warning.
    #[serde(default)]
    pub tolerate_missing_outputs: bool,

    /// Keep file digests between drains of one process.
    #[serde(default)]
    pub reuse_digests: bool,
}

fn default_cache_directory() -> String {
    crate::cache::store::DEFAULT_CACHE_DIR.to_string()
}

fn default_pool_size() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            cache_directory: default_cache_directory(),
            pool_size: default_pool_size(),
            tolerate_missing_outputs: false,
            reuse_digests: false,
        }
    }
}

/// `[plugin.<name>]` section: a shell command run for each task using it.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginConfig {
    pub cmd: String,

    /// Reject tasks that declare no `reads`.
    #[serde(default)]
    pub requires_reads: bool,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    /// Input files, in order.
    #[serde(default)]
    pub reads: Vec<String>,

    /// Output files this task produces.
    #[serde(default)]
    pub writes: Vec<String>,

    /// Tasks that must finish before this one.
    #[serde(default)]
    pub before: Vec<String>,

    /// Tasks that run after this one whenever it is scheduled.
    #[serde(default)]
    pub after: Vec<String>,

    /// Plugins applied in order.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Free-form options passed to plugins and folded into the task digest.
    #[serde(default)]
    pub options: Option<Value>,
}
