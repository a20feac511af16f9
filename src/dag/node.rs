// src/dag/node.rs

//! Per-drain work nodes.

use std::sync::Arc;

use crate::task::TaskDescriptor;

/// Scheduling state of a work node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Waiting on at least one predecessor.
    Pending,
    /// All predecessors done; waiting for a free slot.
    Ready,
    /// Handed to the executor.
    Running,
    /// Finished (skipped, built, or satisfied without outputs).
    Done,
}

/// Runtime tracking structure for one task within one drain.
#[derive(Debug, Clone)]
pub struct WorkNode {
    pub task: Arc<TaskDescriptor>,
    /// Predecessors that have not reached `Done` yet.
    pub remaining: usize,
    /// Nodes that list this one as a predecessor.
    pub dependents: Vec<usize>,
    pub state: NodeState,
}

impl WorkNode {
    pub fn name(&self) -> &str {
        self.task.name()
    }
}

/// A task the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    /// Index of the node; pass it back to `Scheduler::complete`.
    pub index: usize,
    pub task: Arc<TaskDescriptor>,
}

impl ScheduledTask {
    pub fn name(&self) -> &str {
        self.task.name()
    }
}
