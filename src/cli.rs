// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hashbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hashbuild",
    version,
    about = "Incremental, content-addressed task runner.",
    long_about = None
)]
pub struct CliArgs {
    /// Tasks to build, together with everything they depend on.
    #[arg(value_name = "TASK", default_values_t = [String::from("default")])]
    pub tasks: Vec<String>,

    /// Path to the build file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Hashbuild.toml")]
    pub config: String,

    /// Maximum number of tasks running at once (overrides `[config].pool_size`).
    #[arg(short = 'j', long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Cache directory (overrides `[config].cache_directory`).
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HASHBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the task graph without running anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
