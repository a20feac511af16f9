// src/dag/scheduler.rs

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};

use crate::dag::graph::Closure;
use crate::dag::node::{NodeState, ScheduledTask, WorkNode};
use crate::task::TaskName;

/// Per-drain scheduling state machine.
///
/// It is responsible for:
/// - tracking how many predecessors each node still waits on
/// - handing out ready nodes, never more than `pool_size` at once
/// - releasing dependents when a node completes
///
/// The scheduler performs no IO; the drain loop in `engine::runtime` feeds
/// it completions and runs what it dispatches. Ready nodes are handed out in
/// the order they became ready, starting from closure order.
#[derive(Debug)]
pub struct Scheduler {
    nodes: Vec<WorkNode>,
    index: HashMap<TaskName, usize>,
    ready: VecDeque<usize>,
    pool_size: usize,
    running: usize,
    done: usize,
}

impl Scheduler {
    /// Create work nodes for every task in `closure`. A `pool_size` of zero
    /// is treated as one.
    pub fn new(closure: Closure, pool_size: usize) -> Self {
        let mut nodes = Vec::with_capacity(closure.len());
        let mut index = HashMap::with_capacity(closure.len());
        let mut ready = VecDeque::new();

        for (i, node) in closure.into_nodes().into_iter().enumerate() {
            let remaining = node.predecessors.len();
            let state = if remaining == 0 {
                ready.push_back(i);
                NodeState::Ready
            } else {
                NodeState::Pending
            };
            index.insert(node.task.name().to_string(), i);
            nodes.push(WorkNode {
                task: node.task,
                remaining,
                dependents: node.dependents,
                state,
            });
        }

        Self {
            nodes,
            index,
            ready,
            pool_size: pool_size.max(1),
            running: 0,
            done: 0,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.running
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn done_count(&self) -> usize {
        self.done
    }

    /// Every node reached `Done`.
    pub fn is_finished(&self) -> bool {
        self.done == self.nodes.len()
    }

    /// Fixed point without finishing: nothing runs, nothing is ready, but
    /// some nodes are still pending.
    pub fn is_stalled(&self) -> bool {
        self.running == 0 && self.ready.is_empty() && !self.is_finished()
    }

    pub fn state_of(&self, task: &str) -> Option<NodeState> {
        self.index.get(task).map(|&i| self.nodes[i].state)
    }

    pub fn remaining_of(&self, task: &str) -> Option<usize> {
        self.index.get(task).map(|&i| self.nodes[i].remaining)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(WorkNode::name)
    }

    /// Move ready nodes to `Running` while slots are free and return them.
    pub fn dispatch(&mut self) -> Vec<ScheduledTask> {
        let mut scheduled = Vec::new();

        while self.running < self.pool_size {
            let Some(i) = self.ready.pop_front() else {
                break;
            };
            let node = &mut self.nodes[i];
            node.state = NodeState::Running;
            self.running += 1;

            debug!(
                task = %node.name(),
                running = self.running,
                pool_size = self.pool_size,
                "dispatching task"
            );

            scheduled.push(ScheduledTask {
                index: i,
                task: node.task.clone(),
            });
        }

        scheduled
    }

    /// Mark a running node `Done` and release its dependents.
    ///
    /// Returns the names of dependents that became ready. Completing a node
    /// that is not running is ignored.
    pub fn complete(&mut self, index: usize) -> Vec<TaskName> {
        let Some(node) = self.nodes.get_mut(index) else {
            warn!(index, "completion for unknown node; ignoring");
            return Vec::new();
        };

        if node.state != NodeState::Running {
            warn!(
                task = %node.name(),
                state = ?node.state,
                "completion for a task that is not running; ignoring"
            );
            return Vec::new();
        }

        node.state = NodeState::Done;
        self.running -= 1;
        self.done += 1;

        let dependents = node.dependents.clone();
        let mut newly_ready = Vec::new();

        for d in dependents {
            let dep = &mut self.nodes[d];
            if dep.remaining == 0 {
                warn!(task = %dep.name(), "dependent already released; not decrementing");
                continue;
            }
            dep.remaining -= 1;
            if dep.remaining == 0 && dep.state == NodeState::Pending {
                dep.state = NodeState::Ready;
                self.ready.push_back(d);
                newly_ready.push(dep.name().to_string());
            }
        }

        if !newly_ready.is_empty() {
            debug!(ready = ?newly_ready, "dependents became ready");
        }

        newly_ready
    }

    /// Names of nodes that have not reached `Done`, in closure order.
    pub fn leftover(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|node| node.state != NodeState::Done)
            .map(|node| node.name().to_string())
            .collect()
    }
}
