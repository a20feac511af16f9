// src/engine/mod.rs

//! Orchestration engine for hashbuild.
//!
//! This module ties together:
//! - the task and plugin registries
//! - the content hasher and cache store
//! - the drain loop that runs the scheduler to a fixed point
//!
//! [`Orchestrator`] owns all per-invocation state; [`runtime`] holds the
//! async drain loop; [`report`] describes what a drain did.

use std::path::PathBuf;

/// How a task was brought up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Every output was restored from the cache; no plugin ran.
    Skipped,
    /// The task declares no outputs, so there was nothing to build.
    NoOutputs,
    /// The plugin chain ran. `missing` lists declared outputs it did not
    /// produce.
    Built { missing: Vec<PathBuf> },
}

impl TaskOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped)
    }

    pub fn is_built(&self) -> bool {
        matches!(self, TaskOutcome::Built { .. })
    }
}

pub mod orchestrator;
pub mod report;
pub mod runtime;

pub use orchestrator::{EngineConfig, Orchestrator};
pub use report::DrainReport;
pub use runtime::Runtime;
