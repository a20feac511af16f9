// src/errors.rs

//! Crate-wide error type, result alias and non-fatal diagnostics.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::task::TaskName;

/// Fatal errors. Any of these aborts the current registration or drain.
#[derive(Error, Debug)]
pub enum HashbuildError {
    #[error("the {kind} name {name:?} has already been used")]
    DuplicateName { kind: NameKind, name: String },

    #[error("output {path:?} is written by both '{existing}' and '{task}'")]
    ConflictingWriter {
        path: PathBuf,
        existing: TaskName,
        task: TaskName,
    },

    #[error("no task named {0:?}")]
    UnknownTask(String),

    #[error("no plugin named {0:?}")]
    UnknownPlugin(String),

    #[error("invalid plugin: {0}")]
    InvalidPlugin(String),

    #[error("task {task:?} is missing the \"reads\" property required by plugin {plugin:?}")]
    MissingReads { task: TaskName, plugin: String },

    #[error("plugin {plugin:?} failed for task {task:?}: {source:#}")]
    PluginFailed {
        task: TaskName,
        plugin: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("plugin {plugin:?} dropped its completion for task {task:?} without signalling")]
    PluginAbandoned { task: TaskName, plugin: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Which registry a duplicate name was rejected by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameKind {
    Task,
    Plugin,
}

impl fmt::Display for NameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameKind::Task => f.write_str("task"),
            NameKind::Plugin => f.write_str("plugin"),
        }
    }
}

/// Execution-time anomalies that are reported but never abort a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Tasks that can never become ready, either because they form a cycle
    /// or because they sit downstream of one.
    CyclicDependency { tasks: Vec<TaskName> },
    /// A task finished without producing one of its declared outputs.
    MissingOutput { task: TaskName, path: PathBuf },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::CyclicDependency { tasks } => {
                write!(f, "cyclic dependency between tasks: {}", tasks.join(", "))
            }
            Diagnostic::MissingOutput { task, path } => {
                write!(f, "[{task}] missing expected output {path:?}")
            }
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, HashbuildError>;
