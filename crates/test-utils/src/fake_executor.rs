use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use hashbuild::engine::TaskOutcome;
use hashbuild::errors::HashbuildError;
use hashbuild::exec::{TaskExecutor, TaskFuture};
use hashbuild::task::TaskDescriptor;

/// A fake executor that:
/// - records which tasks were "run", in start order
/// - tracks how many ran at the same time
/// - sleeps for `delay`, then reports `NoOutputs` (or fails for `fail_on`).
#[derive(Clone, Default)]
pub struct FakeExecutor {
    delay: Duration,
    fail_on: Option<String>,
    executed: Arc<Mutex<Vec<String>>>,
    current: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
}

impl FakeExecutor {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Make `task` fail instead of finishing.
    pub fn failing_on(mut self, task: &str) -> Self {
        self.fail_on = Some(task.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Highest number of tasks observed running at once.
    pub fn max_concurrency(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for FakeExecutor {
    fn execute(&self, task: Arc<TaskDescriptor>) -> TaskFuture {
        let this = self.clone();

        Box::pin(async move {
            let now = this.current.fetch_add(1, Ordering::SeqCst) + 1;
            this.max_seen.fetch_max(now, Ordering::SeqCst);
            this.executed.lock().unwrap().push(task.name().to_string());

            tokio::time::sleep(this.delay).await;
            this.current.fetch_sub(1, Ordering::SeqCst);

            if this.fail_on.as_deref() == Some(task.name()) {
                return Err(HashbuildError::Other(anyhow!(
                    "fake failure in {}",
                    task.name()
                )));
            }
            Ok(TaskOutcome::NoOutputs)
        })
    }
}
