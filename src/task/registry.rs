// src/task/registry.rs

//! Task registry and write-ownership index.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::{HashbuildError, NameKind, Result};
use crate::task::{TaskDescriptor, TaskName};

/// All registered tasks, in registration order, plus the index of which task
/// writes each output path.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskName, Arc<TaskDescriptor>>,
    order: Vec<TaskName>,
    writers: HashMap<PathBuf, TaskName>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and claim its outputs.
    ///
    /// Nothing is recorded if the task is rejected.
    pub fn register(&mut self, task: TaskDescriptor) -> Result<()> {
        let name = task.name();
        if name.is_empty() || self.tasks.contains_key(name) {
            return Err(HashbuildError::DuplicateName {
                kind: NameKind::Task,
                name: name.to_string(),
            });
        }

        for path in task.writes() {
            if let Some(existing) = self.writers.get(path) {
                return Err(HashbuildError::ConflictingWriter {
                    path: path.clone(),
                    existing: existing.clone(),
                    task: name.to_string(),
                });
            }
        }

        for path in task.writes() {
            self.writers.insert(path.clone(), name.to_string());
        }

        debug!(
            task = %name,
            reads = task.reads().len(),
            writes = task.writes().len(),
            "registered task"
        );

        self.order.push(name.to_string());
        self.tasks.insert(name.to_string(), Arc::new(task));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TaskDescriptor>> {
        self.tasks.get(name)
    }

    /// Look up a task, failing with `UnknownTask` if it was never registered.
    pub fn require(&self, name: &str) -> Result<&Arc<TaskDescriptor>> {
        self.get(name)
            .ok_or_else(|| HashbuildError::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// The task that declared `path` as an output, if any.
    pub fn writer_of(&self, path: &Path) -> Option<&str> {
        self.writers.get(path).map(String::as_str)
    }

    /// Task names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
