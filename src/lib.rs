// src/lib.rs

pub mod cache;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod task;

use std::fmt::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_and_validate};
use crate::dag::Closure;
use crate::engine::Orchestrator;

pub use crate::engine::{DrainReport, EngineConfig, TaskOutcome};
pub use crate::errors::{Diagnostic, HashbuildError};
pub use crate::exec::{Completion, Plugin};
pub use crate::task::TaskDescriptor;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - build file loading
/// - orchestrator construction and registration
/// - scheduling the requested tasks
/// - a single drain (or a dry-run listing)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(jobs) = args.jobs {
        cfg.config.pool_size = jobs.max(1);
    }
    if let Some(ref dir) = args.cache_dir {
        cfg.config.cache_directory = dir.clone();
    }

    let root = config_root_dir(&config_path);
    let mut orchestrator = cfg.into_orchestrator(root)?;

    for task in &args.tasks {
        orchestrator.schedule_task(task)?;
    }
    info!(tasks = ?args.tasks, "requested tasks");

    if args.dry_run {
        print!("{}", render_dry_run(&orchestrator.plan()?, &orchestrator));
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let report = orchestrator.drain().await?;

    if !report.is_complete() {
        warn!(stuck = ?report.stuck, "build finished with unresolved tasks");
    }
    info!(
        built = report.built().len(),
        skipped = report.skipped().len(),
        total = report.outcomes.len(),
        "build finished"
    );

    Ok(())
}

/// Dry-run output: tasks in dependency order with their inputs, outputs,
/// predecessors and plugins, followed by any cycles.
pub fn render_dry_run(closure: &Closure, orchestrator: &Orchestrator) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_dry_run(&mut out, closure, orchestrator);
    out
}

fn write_dry_run(out: &mut String, closure: &Closure, orchestrator: &Orchestrator) -> fmt::Result {
    writeln!(out, "hashbuild dry-run")?;
    writeln!(out, "  root = {:?}", orchestrator.root())?;
    writeln!(out, "  cache = {:?}", orchestrator.store().dir())?;
    writeln!(out, "  pool_size = {}", orchestrator.config().pool_size)?;
    writeln!(out)?;

    let order: Vec<&str> = closure
        .topological_order()
        .unwrap_or_else(|| closure.task_names().collect());

    writeln!(out, "tasks ({}):", closure.len())?;
    for name in order {
        writeln!(out, "  - {name}")?;
        let Some(node) = closure.get(name) else {
            continue;
        };
        let task = &node.task;
        if !task.reads().is_empty() {
            writeln!(out, "      reads: {:?}", task.reads())?;
        }
        if !task.writes().is_empty() {
            writeln!(out, "      writes: {:?}", task.writes())?;
        }
        let preds = closure.predecessors_of(name);
        if !preds.is_empty() {
            writeln!(out, "      before: {:?}", preds)?;
        }
        if !task.plugins().is_empty() {
            writeln!(out, "      plugins: {:?}", task.plugins())?;
        }
    }

    for cycle in closure.cycles() {
        writeln!(out)?;
        writeln!(out, "cycle: {}", cycle.join(" -> "))?;
    }

    Ok(())
}
