// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dag::Scheduler;
use crate::engine::TaskOutcome;
use crate::engine::report::DrainReport;
use crate::errors::{Diagnostic, Result};
use crate::exec::TaskExecutor;
use crate::task::TaskName;

/// Drives a [`Scheduler`] to its fixed point, delegating each ready task to
/// a [`TaskExecutor`].
///
/// Scheduler state is only touched from this loop, between completions, so
/// running tasks never contend for it.
pub struct Runtime {
    scheduler: Scheduler,
    executor: Arc<dyn TaskExecutor>,
    cycles: Vec<Vec<TaskName>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("scheduler", &self.scheduler)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(scheduler: Scheduler, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            scheduler,
            executor,
            cycles: Vec::new(),
        }
    }

    /// Cycles found while building the closure, carried into the report.
    pub fn with_cycles(mut self, cycles: Vec<Vec<TaskName>>) -> Self {
        self.cycles = cycles;
        self
    }

    /// Main drain loop.
    ///
    /// - Dispatches ready tasks while pool slots are free.
    /// - Waits for the next completion and releases its dependents.
    /// - Stops when nothing is running and nothing is ready.
    ///
    /// A task error aborts every task still in flight and is returned as is.
    pub async fn run(mut self) -> Result<DrainReport> {
        info!(
            tasks = self.scheduler.len(),
            pool_size = self.scheduler.pool_size(),
            "drain started"
        );

        let cycles = std::mem::take(&mut self.cycles);
        let mut report = DrainReport {
            diagnostics: cycles
                .iter()
                .map(|cycle| Diagnostic::CyclicDependency {
                    tasks: cycle.clone(),
                })
                .collect(),
            cycles,
            ..DrainReport::default()
        };
        let mut in_flight: JoinSet<(usize, Result<TaskOutcome>)> = JoinSet::new();

        loop {
            for scheduled in self.scheduler.dispatch() {
                let index = scheduled.index;
                let run = self.executor.execute(scheduled.task);
                in_flight.spawn(async move { (index, run.await) });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let (index, result) = match joined {
                Ok(pair) => pair,
                Err(err) => {
                    in_flight.abort_all();
                    if err.is_panic() {
                        std::panic::resume_unwind(err.into_panic());
                    }
                    return Err(anyhow!("task execution was cancelled: {err}").into());
                }
            };

            let name = self.scheduler.name_of(index).unwrap_or_default().to_string();

            match result {
                Ok(outcome) => {
                    debug!(task = %name, ?outcome, "task finished");
                    report.record(&name, outcome);
                    self.scheduler.complete(index);
                }
                Err(err) => {
                    error!(task = %name, error = %err, "task failed; aborting drain");
                    in_flight.abort_all();
                    return Err(err);
                }
            }
        }

        if self.scheduler.is_stalled() {
            let stuck = self.scheduler.leftover();
            warn!(
                tasks = ?stuck,
                "cyclic dependency: {} task(s) left unresolved",
                stuck.len()
            );
            report.diagnostics.push(Diagnostic::CyclicDependency {
                tasks: stuck.clone(),
            });
            report.stuck = stuck;
        }

        info!(
            finished = report.outcomes.len(),
            stuck = report.stuck.len(),
            "drain finished"
        );

        Ok(report)
    }
}
