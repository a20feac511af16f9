// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`plugin`] defines the [`Plugin`] contract, its single-use
//!   [`Completion`] signal and the [`PluginRegistry`].
//! - [`command`] provides [`CommandPlugin`], a built-in plugin that runs a
//!   shell command.
//! - [`task_runner`] brings one task up to date (digest, restore or run the
//!   plugin chain, save).
//! - [`backend`] provides the [`TaskExecutor`] trait the drain loop uses and
//!   the production [`CachingExecutor`].

pub mod backend;
pub mod command;
pub mod plugin;
pub mod task_runner;

pub use backend::{CachingExecutor, TaskExecutor, TaskFuture};
pub use command::CommandPlugin;
pub use plugin::{Completion, Plugin, PluginRegistry, plugin_fn};
pub use task_runner::{RunContext, run_task};
