// src/task/mod.rs

//! Task descriptors and the task registry.
//!
//! - [`descriptor`] holds the immutable [`TaskDescriptor`] and its builder,
//!   which applies defaults for every optional field exactly once.
//! - [`registry`] owns all registered tasks plus the write-ownership index
//!   mapping each output path to the single task that produces it.

pub mod descriptor;
pub mod registry;

pub use descriptor::{TaskBuilder, TaskDescriptor};
pub use registry::TaskRegistry;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;
