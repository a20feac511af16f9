// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The drain loop talks to a [`TaskExecutor`] instead of running tasks
//! itself. Production code uses [`CachingExecutor`], which hashes, restores,
//! runs plugins and saves; tests can substitute an executor that only
//! records what it was asked to run.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::engine::TaskOutcome;
use crate::errors::Result;
use crate::exec::task_runner::{RunContext, run_task};
use crate::task::TaskDescriptor;

/// Boxed future returned by [`TaskExecutor::execute`].
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<TaskOutcome>> + Send + 'static>>;

/// Trait abstracting how a ready task is brought up to date.
pub trait TaskExecutor: Send + Sync {
    /// Run `task` to completion. The future is spawned onto the runtime, so
    /// it must own everything it needs.
    fn execute(&self, task: Arc<TaskDescriptor>) -> TaskFuture;
}

/// Executor used in production: cache lookup first, plugin chain on a miss.
#[derive(Debug, Clone)]
pub struct CachingExecutor {
    ctx: Arc<RunContext>,
}

impl CachingExecutor {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }
}

impl TaskExecutor for CachingExecutor {
    fn execute(&self, task: Arc<TaskDescriptor>) -> TaskFuture {
        let ctx = Arc::clone(&self.ctx);
        Box::pin(async move { run_task(&ctx, task).await })
    }
}
