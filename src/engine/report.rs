// src/engine/report.rs

use crate::engine::TaskOutcome;
use crate::errors::Diagnostic;
use crate::task::TaskName;

/// Summary of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Finished tasks, in completion order.
    pub outcomes: Vec<(TaskName, TaskOutcome)>,
    /// Tasks that never ran because they were stuck behind a cycle.
    pub stuck: Vec<TaskName>,
    /// Cycles found while building the closure.
    pub cycles: Vec<Vec<TaskName>>,
    /// Non-fatal anomalies: one per detected cycle, one per missing output,
    /// and one listing leftover tasks if the drain stalled.
    pub diagnostics: Vec<Diagnostic>,
}

impl DrainReport {
    pub fn record(&mut self, task: &str, outcome: TaskOutcome) {
        if let TaskOutcome::Built { missing } = &outcome {
            for path in missing {
                self.diagnostics.push(Diagnostic::MissingOutput {
                    task: task.to_string(),
                    path: path.clone(),
                });
            }
        }
        self.outcomes.push((task.to_string(), outcome));
    }

    pub fn outcome_of(&self, task: &str) -> Option<&TaskOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, outcome)| outcome)
    }

    /// Names of finished tasks, in completion order.
    pub fn finished(&self) -> Vec<&str> {
        self.outcomes.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Names of tasks whose plugin chain ran.
    pub fn built(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_built())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Names of tasks restored from the cache.
    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_skipped())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Whether every task in the closure finished.
    pub fn is_complete(&self) -> bool {
        self.stuck.is_empty()
    }
}
