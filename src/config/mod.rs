// src/config/mod.rs

//! Build file loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a build file from disk and turn it into a populated
//!   `Orchestrator` (`loader.rs`).
//! - Validate references and engine settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    config_root_dir, default_config_path, load_and_validate, load_from_path, parse_str,
};
pub use model::{ConfigFile, ConfigSection, PluginConfig, RawConfigFile, TaskConfig};
pub use validate::validate_config;
