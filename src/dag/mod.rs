// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] expands requested tasks into a [`Closure`] with resolved
//!   ordering edges and detects cycles.
//! - [`node`] holds the per-drain [`WorkNode`] and its [`NodeState`].
//! - [`scheduler`] is the synchronous state machine that hands out ready
//!   tasks up to the pool size and releases dependents on completion.

pub mod graph;
pub mod node;
pub mod scheduler;

pub use graph::{Closure, ClosureNode};
pub use node::{NodeState, ScheduledTask, WorkNode};
pub use scheduler::Scheduler;
