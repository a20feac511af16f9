// src/dag/graph.rs

//! Dependency graph builder.
//!
//! Expands a set of requested task names into the closure of tasks that
//! must be considered, with ordering edges resolved:
//!
//! - explicit predecessors from `before`,
//! - implied predecessors: the writer of every path a task reads,
//! - `after` successors, which pull the named task in behind the one that
//!   lists it.
//!
//! Cycles are found with a three-color depth-first search and reported as
//! diagnostics. They are not fatal: the edges stay in place, so the tasks
//! involved simply never become ready and the scheduler reports them when
//! the drain reaches its fixed point.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use petgraph::visit::{DfsEvent, depth_first_search};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::task::{TaskDescriptor, TaskName, TaskRegistry};

/// One task of the closure with its resolved edges (indices into the
/// closure).
#[derive(Debug, Clone)]
pub struct ClosureNode {
    pub task: Arc<TaskDescriptor>,
    pub predecessors: Vec<usize>,
    pub dependents: Vec<usize>,
}

impl ClosureNode {
    pub fn name(&self) -> &str {
        self.task.name()
    }
}

/// The set of tasks one drain has to consider, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    nodes: Vec<ClosureNode>,
    index: HashMap<TaskName, usize>,
    cycles: Vec<Vec<TaskName>>,
}

impl Closure {
    /// Build the closure of `roots`.
    ///
    /// Fails with `UnknownTask` if a root or any `before`/`after` reference
    /// is not registered.
    pub fn build(registry: &TaskRegistry, roots: &[TaskName]) -> Result<Self> {
        let members = expand(registry, roots)?;

        let index: HashMap<TaskName, usize> = members
            .iter()
            .enumerate()
            .map(|(i, task)| (task.name().to_string(), i))
            .collect();

        let mut nodes: Vec<ClosureNode> = members
            .iter()
            .map(|task| ClosureNode {
                task: Arc::clone(task),
                predecessors: Vec::new(),
                dependents: Vec::new(),
            })
            .collect();

        for (i, task) in members.iter().enumerate() {
            for pred in predecessors_of(registry, task) {
                if let Some(&p) = index.get(pred) {
                    add_edge(&mut nodes, p, i);
                }
            }
            for succ in task.after() {
                if let Some(&s) = index.get(succ.as_str()) {
                    add_edge(&mut nodes, i, s);
                }
            }
        }

        let mut closure = Self {
            nodes,
            index,
            cycles: Vec::new(),
        };
        closure.cycles = closure.find_cycles();

        for cycle in &closure.cycles {
            warn!(tasks = ?cycle, "cyclic dependency detected; these tasks will not run");
        }
        debug!(
            roots = ?roots,
            tasks = closure.nodes.len(),
            cycles = closure.cycles.len(),
            "built task closure"
        );

        Ok(closure)
    }

    pub fn nodes(&self) -> &[ClosureNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<ClosureNode> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ClosureNode> {
        self.index.get(name).map(|&i| &self.nodes[i])
    }

    /// Task names in discovery order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(ClosureNode::name)
    }

    /// In-closure predecessors of `name`.
    pub fn predecessors_of(&self, name: &str) -> Vec<&str> {
        self.get(name)
            .map(|node| {
                node.predecessors
                    .iter()
                    .map(|&p| self.nodes[p].name())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every cycle found, each listed in dependency order starting from the
    /// task where the search re-entered it.
    pub fn cycles(&self) -> &[Vec<TaskName>] {
        &self.cycles
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// A dependency-respecting order of all tasks, or `None` if the closure
    /// has a cycle.
    pub fn topological_order(&self) -> Option<Vec<&str>> {
        toposort(&self.edge_graph(), None)
            .ok()
            .map(|order| order.into_iter().map(|i| self.nodes[i].name()).collect())
    }

    // Edge direction: predecessor -> dependent.
    fn edge_graph(&self) -> DiGraphMap<usize, ()> {
        let mut graph = DiGraphMap::new();
        for i in 0..self.nodes.len() {
            graph.add_node(i);
        }
        for (i, node) in self.nodes.iter().enumerate() {
            for &d in &node.dependents {
                graph.add_edge(i, d, ());
            }
        }
        graph
    }

    fn find_cycles(&self) -> Vec<Vec<TaskName>> {
        let graph = self.edge_graph();
        let mut path: Vec<usize> = Vec::new();
        let mut cycles = Vec::new();

        depth_first_search(&graph, 0..self.nodes.len(), |event| match event {
            DfsEvent::Discover(n, _) => path.push(n),
            DfsEvent::Finish(_, _) => {
                path.pop();
            }
            // `to` is still in progress, so it is on the current path.
            DfsEvent::BackEdge(_, to) => {
                if let Some(start) = path.iter().position(|&n| n == to) {
                    cycles.push(
                        path[start..]
                            .iter()
                            .map(|&i| self.nodes[i].name().to_string())
                            .collect(),
                    );
                }
            }
            _ => {}
        });

        cycles
    }
}

/// Collect every task reachable from `roots`, breadth first.
fn expand(registry: &TaskRegistry, roots: &[TaskName]) -> Result<Vec<Arc<TaskDescriptor>>> {
    let mut queue: VecDeque<&str> = VecDeque::new();
    for root in roots {
        registry.require(root)?;
        queue.push_back(root.as_str());
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut members = Vec::new();

    while let Some(name) = queue.pop_front() {
        if !seen.insert(name) {
            continue;
        }
        let task = registry.require(name)?;

        for pred in predecessors_of(registry, task) {
            registry.require(pred)?;
            queue.push_back(pred);
        }
        for succ in task.after() {
            registry.require(succ)?;
            queue.push_back(succ.as_str());
        }

        members.push(Arc::clone(task));
    }

    Ok(members)
}

/// Explicit `before` names followed by the writers of every read path,
/// without duplicates and never the task itself.
fn predecessors_of<'a>(registry: &'a TaskRegistry, task: &'a TaskDescriptor) -> Vec<&'a str> {
    let mut preds: Vec<&str> = Vec::new();

    for name in task.before() {
        if !preds.contains(&name.as_str()) {
            preds.push(name.as_str());
        }
    }

    for path in task.reads() {
        if let Some(writer) = registry.writer_of(path) {
            if writer != task.name() && !preds.contains(&writer) {
                debug!(task = %task.name(), writer = %writer, path = ?path, "implied dependency");
                preds.push(writer);
            }
        }
    }

    preds
}

fn add_edge(nodes: &mut [ClosureNode], from: usize, to: usize) {
    if !nodes[to].predecessors.contains(&from) {
        nodes[to].predecessors.push(from);
        nodes[from].dependents.push(to);
    }
}
