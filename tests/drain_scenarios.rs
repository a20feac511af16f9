// tests/drain_scenarios.rs

mod common;
use crate::common::{TestProject, TestResult, init_tracing, with_timeout};

use std::path::PathBuf;

use hashbuild::engine::{Orchestrator, TaskOutcome};
use hashbuild::errors::{Diagnostic, HashbuildError};
use hashbuild::task::TaskDescriptor;
use hashbuild_test_utils::plugins::{
    RecordingPlugin, abandoning_plugin, double_complete_plugin, failing_plugin, noop_plugin,
    rejecting_plugin, upper_plugin,
};

/// `compile` upper-cases `a.src` into `a.out`; the transform is wrapped so
/// we can count how often it runs.
fn compile_project(project: &TestProject) -> Result<(Orchestrator, RecordingPlugin), HashbuildError> {
    let mut orch = project.orchestrator(2);
    let counter = RecordingPlugin::new(project.root().join("scratch"));

    orch.register_plugin("transform", upper_plugin(project.root().to_path_buf()))?;
    orch.register_plugin("count", counter.clone())?;
    orch.register_task(
        TaskDescriptor::builder("compile")
            .read("a.src")
            .write("a.out")
            .plugin("count")
            .plugin("transform")
            .build(),
    )?;

    Ok((orch, counter))
}

#[tokio::test]
async fn compile_builds_then_skips_then_rebuilds_on_change() -> TestResult {
    init_tracing();
    let project = TestProject::new();
    project.write("a.src", "hello");
    let (mut orch, counter) = compile_project(&project)?;

    let first = with_timeout(orch.run_tasks(["compile"])).await?;
    assert_eq!(first.built(), vec!["compile"]);
    assert_eq!(project.read("a.out").as_deref(), Some("HELLO"));
    assert_eq!(counter.count(), 1);
    assert_eq!(project.cache_entries(), 1);

    let second = with_timeout(orch.run_tasks(["compile"])).await?;
    assert_eq!(second.skipped(), vec!["compile"]);
    assert_eq!(project.read("a.out").as_deref(), Some("HELLO"));
    assert_eq!(counter.count(), 1);

    project.write("a.src", "world");
    let third = with_timeout(orch.run_tasks(["compile"])).await?;
    assert_eq!(third.built(), vec!["compile"]);
    assert_eq!(project.read("a.out").as_deref(), Some("WORLD"));
    assert_eq!(counter.count(), 2);
    assert_eq!(project.cache_entries(), 2);

    Ok(())
}

#[tokio::test]
async fn reverting_an_input_restores_the_earlier_output() -> TestResult {
    let project = TestProject::new();
    project.write("a.src", "hello");
    let (mut orch, counter) = compile_project(&project)?;

    with_timeout(orch.run_tasks(["compile"])).await?;
    project.write("a.src", "world");
    with_timeout(orch.run_tasks(["compile"])).await?;
    assert_eq!(counter.count(), 2);

    project.write("a.src", "hello");
    let report = with_timeout(orch.run_tasks(["compile"])).await?;

    assert_eq!(report.outcome_of("compile"), Some(&TaskOutcome::Skipped));
    assert_eq!(project.read("a.out").as_deref(), Some("HELLO"));
    assert_eq!(counter.count(), 2);
    Ok(())
}

#[tokio::test]
async fn deleted_output_is_restored_from_cache() -> TestResult {
    let project = TestProject::new();
    project.write("a.src", "hello");
    let (mut orch, counter) = compile_project(&project)?;

    with_timeout(orch.run_tasks(["compile"])).await?;
    project.remove("a.out");

    let report = with_timeout(orch.run_tasks(["compile"])).await?;
    assert_eq!(report.skipped(), vec!["compile"]);
    assert_eq!(project.read("a.out").as_deref(), Some("HELLO"));
    assert_eq!(counter.count(), 1);
    Ok(())
}

#[tokio::test]
async fn input_change_propagates_through_generated_files() -> TestResult {
    init_tracing();
    let project = TestProject::new();
    project.write("in.txt", "abc");
    project.write("u.src", "untouched");

    let mut orch = project.orchestrator(4);
    orch.register_plugin("upper", upper_plugin(project.root().to_path_buf()))?;
    orch.register_task(
        TaskDescriptor::builder("stage1")
            .read("in.txt")
            .write("mid.txt")
            .plugin("upper")
            .build(),
    )?;
    orch.register_task(
        TaskDescriptor::builder("stage2")
            .read("mid.txt")
            .write("out/final.txt")
            .plugin("upper")
            .build(),
    )?;
    orch.register_task(
        TaskDescriptor::builder("unrelated")
            .read("u.src")
            .write("z.txt")
            .plugin("upper")
            .build(),
    )?;

    let first = with_timeout(orch.run_tasks(["stage2", "unrelated"])).await?;
    assert_eq!(first.built().len(), 3);
    assert_eq!(project.read("out/final.txt").as_deref(), Some("ABC"));
    assert_eq!(project.read("z.txt").as_deref(), Some("UNTOUCHED"));

    let second = with_timeout(orch.run_tasks(["stage2", "unrelated"])).await?;
    assert!(second.built().is_empty());
    assert_eq!(second.skipped().len(), 3);

    project.write("in.txt", "xyz");
    let third = with_timeout(orch.run_tasks(["stage2", "unrelated"])).await?;
    assert_eq!(third.built(), vec!["stage1", "stage2"]);
    assert_eq!(third.skipped(), vec!["unrelated"]);
    assert_eq!(project.read("mid.txt").as_deref(), Some("XYZ"));
    assert_eq!(project.read("out/final.txt").as_deref(), Some("XYZ"));
    assert_eq!(project.read("z.txt").as_deref(), Some("UNTOUCHED"));

    let fourth = with_timeout(orch.run_tasks(["stage2", "unrelated"])).await?;
    assert!(fourth.built().is_empty());
    Ok(())
}

#[tokio::test]
async fn task_without_outputs_is_done_without_plugins() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    let recorder = RecordingPlugin::new(project.root());

    orch.register_plugin("record", recorder.clone())?;
    orch.register_task(TaskDescriptor::builder("leaf").write("leaf.out").plugin("record").build())?;
    orch.register_task(
        TaskDescriptor::builder("default")
            .before("leaf")
            .plugin("record")
            .build(),
    )?;

    let report = with_timeout(orch.run_tasks(["default"])).await?;

    assert_eq!(report.outcome_of("default"), Some(&TaskOutcome::NoOutputs));
    assert_eq!(recorder.applied(), vec!["leaf".to_string()]);
    assert_eq!(report.finished(), vec!["leaf", "default"]);
    Ok(())
}

#[tokio::test]
async fn cycle_is_reported_and_independent_work_completes() -> TestResult {
    init_tracing();
    let project = TestProject::new();
    let mut orch = project.orchestrator(2);
    let recorder = RecordingPlugin::new(project.root());

    orch.register_plugin("record", recorder.clone())?;
    for (name, dep) in [("a", "b"), ("b", "a")] {
        orch.register_task(
            TaskDescriptor::builder(name)
                .before(dep)
                .write(format!("{name}.out"))
                .plugin("record")
                .build(),
        )?;
    }
    orch.register_task(TaskDescriptor::builder("free").write("free.out").plugin("record").build())?;

    let report = with_timeout(orch.run_tasks(["a", "free"])).await?;

    assert_eq!(report.finished(), vec!["free"]);
    assert!(!report.is_complete());
    let mut stuck = report.stuck.clone();
    stuck.sort();
    assert_eq!(stuck, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(report.cycles.len(), 1);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| matches!(d, Diagnostic::CyclicDependency { .. })));
    assert_eq!(recorder.applied(), vec!["free".to_string()]);
    Ok(())
}

#[tokio::test]
async fn unproduced_output_is_a_diagnostic() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);

    orch.register_plugin("noop", noop_plugin())?;
    orch.register_task(TaskDescriptor::builder("lazy").write("never.out").plugin("noop").build())?;

    let report = with_timeout(orch.run_tasks(["lazy"])).await?;

    assert_eq!(
        report.outcome_of("lazy"),
        Some(&TaskOutcome::Built {
            missing: vec![PathBuf::from("never.out")]
        })
    );
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::MissingOutput {
            task: "lazy".to_string(),
            path: PathBuf::from("never.out"),
        }]
    );
    assert!(report.is_complete());
    Ok(())
}

#[tokio::test]
async fn second_completion_signal_is_ignored() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    let recorder = RecordingPlugin::new(project.root());

    orch.register_plugin("twice", double_complete_plugin())?;
    orch.register_plugin("record", recorder.clone())?;
    orch.register_task(
        TaskDescriptor::builder("t")
            .write("t.out")
            .plugin("twice")
            .plugin("record")
            .build(),
    )?;

    let report = with_timeout(orch.run_tasks(["t"])).await?;

    assert_eq!(report.built(), vec!["t"]);
    assert_eq!(recorder.count(), 1);
    assert!(report.diagnostics.is_empty());
    Ok(())
}

#[tokio::test]
async fn plugin_failure_aborts_the_drain() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    let recorder = RecordingPlugin::new(project.root());

    orch.register_plugin("boom", failing_plugin("compiler exploded"))?;
    orch.register_plugin("record", recorder.clone())?;
    orch.register_task(TaskDescriptor::builder("bad").write("bad.out").plugin("boom").build())?;
    orch.register_task(
        TaskDescriptor::builder("later")
            .before("bad")
            .write("later.out")
            .plugin("record")
            .build(),
    )?;

    let err = with_timeout(orch.run_tasks(["later"])).await.unwrap_err();

    match err {
        HashbuildError::PluginFailed { task, plugin, source } => {
            assert_eq!(task, "bad");
            assert_eq!(plugin, "boom");
            assert!(source.to_string().contains("compiler exploded"));
        }
        other => panic!("expected PluginFailed, got {other:?}"),
    }
    assert_eq!(recorder.count(), 0);
    assert!(orch.scheduled().is_empty());
    Ok(())
}

#[tokio::test]
async fn plugin_error_from_apply_is_fatal() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);

    orch.register_plugin("reject", rejecting_plugin("bad options"))?;
    orch.register_task(TaskDescriptor::builder("t").write("t.out").plugin("reject").build())?;

    let err = with_timeout(orch.run_tasks(["t"])).await.unwrap_err();
    assert!(matches!(err, HashbuildError::PluginFailed { ref plugin, .. } if plugin == "reject"));
    Ok(())
}

#[tokio::test]
async fn dropped_completion_is_reported() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);

    orch.register_plugin("ghost", abandoning_plugin())?;
    orch.register_task(TaskDescriptor::builder("t").write("t.out").plugin("ghost").build())?;

    let err = with_timeout(orch.run_tasks(["t"])).await.unwrap_err();
    assert!(matches!(
        err,
        HashbuildError::PluginAbandoned { ref task, ref plugin } if task == "t" && plugin == "ghost"
    ));
    Ok(())
}

#[tokio::test]
async fn plugin_requiring_reads_rejects_task_without_reads() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    let strict = RecordingPlugin::new(project.root()).requiring_reads();

    orch.register_plugin("strict", strict.clone())?;
    orch.register_task(TaskDescriptor::builder("t").write("t.out").plugin("strict").build())?;

    let err = with_timeout(orch.run_tasks(["t"])).await.unwrap_err();
    assert!(matches!(err, HashbuildError::MissingReads { .. }));
    assert_eq!(strict.count(), 0);
    Ok(())
}

#[tokio::test]
async fn unregistered_plugin_fails_when_task_runs() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    orch.register_task(TaskDescriptor::builder("t").write("t.out").plugin("nowhere").build())?;

    let err = with_timeout(orch.run_tasks(["t"])).await.unwrap_err();
    assert!(matches!(err, HashbuildError::UnknownPlugin(name) if name == "nowhere"));
    Ok(())
}

#[tokio::test]
async fn orchestrators_do_not_share_state() -> TestResult {
    let one = TestProject::new();
    let two = TestProject::new();
    let mut first = one.orchestrator(1);
    let mut second = two.orchestrator(1);

    first.register_task(TaskDescriptor::builder("shared").build())?;
    second.register_task(TaskDescriptor::builder("shared").build())?;

    assert!(first.plugins().is_empty());
    assert_eq!(with_timeout(first.run_tasks(["shared"])).await?.finished(), vec!["shared"]);
    assert_eq!(with_timeout(second.run_tasks(["shared"])).await?.finished(), vec!["shared"]);
    Ok(())
}
