// src/task/descriptor.rs

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::task::TaskName;

/// A named unit of build work.
///
/// Descriptors are immutable once built; the engine shares them between the
/// registry, the scheduler and plugins through `Arc<TaskDescriptor>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDescriptor {
    name: TaskName,
    reads: Vec<PathBuf>,
    writes: Vec<PathBuf>,
    before: Vec<TaskName>,
    after: Vec<TaskName>,
    plugins: Vec<String>,
    options: Value,
}

impl TaskDescriptor {
    /// Start building a descriptor for `name`.
    pub fn builder(name: impl Into<TaskName>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Input files, in declared order. The order is part of the task digest.
    pub fn reads(&self) -> &[PathBuf] {
        &self.reads
    }

    /// Output files, in declared order.
    pub fn writes(&self) -> &[PathBuf] {
        &self.writes
    }

    /// Tasks that must finish before this one starts.
    pub fn before(&self) -> &[TaskName] {
        &self.before
    }

    /// Tasks that are pulled into the run whenever this one is, and ordered
    /// after it.
    pub fn after(&self) -> &[TaskName] {
        &self.after
    }

    /// Plugin names applied in order when the task has to run.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Whether this task declares `path` as one of its inputs.
    pub fn reads_path(&self, path: &Path) -> bool {
        self.reads.iter().any(|p| p == path)
    }
}

/// Builder for [`TaskDescriptor`].
///
/// Every optional field starts out empty (`options` starts as `{}`), so the
/// rest of the engine never has to deal with absent values.
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    task: TaskDescriptor,
}

impl TaskBuilder {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            task: TaskDescriptor {
                name: name.into(),
                reads: Vec::new(),
                writes: Vec::new(),
                before: Vec::new(),
                after: Vec::new(),
                plugins: Vec::new(),
                options: Value::Object(Default::default()),
            },
        }
    }

    pub fn read(mut self, path: impl Into<PathBuf>) -> Self {
        self.task.reads.push(path.into());
        self
    }

    pub fn reads<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.task.reads.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Add an output. Repeated paths are kept once.
    pub fn write(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !self.task.writes.contains(&path) {
            self.task.writes.push(path);
        }
        self
    }

    pub fn writes<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().fold(self, |builder, path| builder.write(path))
    }

    /// Add an explicit predecessor. Repeated names are kept once.
    pub fn before(mut self, task: impl Into<TaskName>) -> Self {
        let task = task.into();
        if !self.task.before.contains(&task) {
            self.task.before.push(task);
        }
        self
    }

    /// Add a task that runs after this one whenever this one is scheduled.
    pub fn after(mut self, task: impl Into<TaskName>) -> Self {
        let task = task.into();
        if !self.task.after.contains(&task) {
            self.task.after.push(task);
        }
        self
    }

    pub fn plugin(mut self, name: impl Into<String>) -> Self {
        self.task.plugins.push(name.into());
        self
    }

    pub fn options(mut self, options: Value) -> Self {
        self.task.options = options;
        self
    }

    pub fn build(self) -> TaskDescriptor {
        self.task
    }
}
