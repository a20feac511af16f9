// tests/task_registry.rs

mod common;
use crate::common::{TestProject, TestResult, init_tracing};

use std::path::Path;

use hashbuild::errors::{HashbuildError, NameKind};
use hashbuild::exec::plugin_fn;
use hashbuild::task::{TaskDescriptor, TaskRegistry};

fn noop() -> impl hashbuild::exec::Plugin {
    plugin_fn(|_task, done| {
        done.complete();
        Ok(())
    })
}

#[test]
fn builder_defaults_are_empty() {
    let task = TaskDescriptor::builder("bare").build();

    assert_eq!(task.name(), "bare");
    assert!(task.reads().is_empty());
    assert!(task.writes().is_empty());
    assert!(task.before().is_empty());
    assert!(task.after().is_empty());
    assert!(task.plugins().is_empty());
    assert_eq!(task.options(), &serde_json::json!({}));
}

#[test]
fn builder_keeps_repeated_before_once() {
    let task = TaskDescriptor::builder("t")
        .before("a")
        .before("b")
        .before("a")
        .build();

    assert_eq!(task.before(), ["a".to_string(), "b".to_string()]);
}

#[test]
fn builder_keeps_repeated_writes_once() {
    let task = TaskDescriptor::builder("t")
        .write("a.out")
        .writes(["b.out", "a.out"])
        .write("b.out")
        .build();

    assert_eq!(task.writes(), [Path::new("a.out"), Path::new("b.out")]);

    let mut registry = TaskRegistry::new();
    registry.register(task).unwrap();
    assert_eq!(registry.writer_of(Path::new("a.out")), Some("t"));
}

#[test]
fn duplicate_task_name_is_rejected() {
    let mut registry = TaskRegistry::new();
    registry
        .register(TaskDescriptor::builder("compile").build())
        .unwrap();

    let err = registry
        .register(TaskDescriptor::builder("compile").build())
        .unwrap_err();

    match err {
        HashbuildError::DuplicateName { kind, name } => {
            assert_eq!(kind, NameKind::Task);
            assert_eq!(name, "compile");
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }
    assert_eq!(registry.len(), 1);
}

#[test]
fn empty_task_name_is_rejected() {
    let mut registry = TaskRegistry::new();
    let err = registry.register(TaskDescriptor::builder("").build());
    assert!(matches!(err, Err(HashbuildError::DuplicateName { .. })));
    assert!(registry.is_empty());
}

#[test]
fn conflicting_writer_is_rejected_without_partial_claims() {
    let mut registry = TaskRegistry::new();
    registry
        .register(TaskDescriptor::builder("first").write("out/a.txt").build())
        .unwrap();

    let err = registry
        .register(
            TaskDescriptor::builder("second")
                .write("out/b.txt")
                .write("out/a.txt")
                .build(),
        )
        .unwrap_err();

    match err {
        HashbuildError::ConflictingWriter { path, existing, task } => {
            assert_eq!(path, Path::new("out/a.txt"));
            assert_eq!(existing, "first");
            assert_eq!(task, "second");
        }
        other => panic!("expected ConflictingWriter, got {other:?}"),
    }

    assert!(!registry.contains("second"));
    assert_eq!(registry.writer_of(Path::new("out/a.txt")), Some("first"));
    assert_eq!(registry.writer_of(Path::new("out/b.txt")), None);
}

#[test]
fn registry_preserves_registration_order() {
    let mut registry = TaskRegistry::new();
    for name in ["zeta", "alpha", "mid"] {
        registry
            .register(TaskDescriptor::builder(name).build())
            .unwrap();
    }

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn duplicate_and_unnamed_plugins_are_rejected() -> TestResult {
    init_tracing();
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);

    orch.register_plugin("copy", noop())?;

    match orch.register_plugin("copy", noop()) {
        Err(HashbuildError::DuplicateName { kind, name }) => {
            assert_eq!(kind, NameKind::Plugin);
            assert_eq!(name, "copy");
        }
        other => panic!("expected DuplicateName, got {other:?}"),
    }

    assert!(matches!(
        orch.register_plugin("", noop()),
        Err(HashbuildError::InvalidPlugin(_))
    ));
    assert_eq!(orch.plugins().len(), 1);

    Ok(())
}

#[test]
fn scheduling_unknown_task_fails() {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);

    let err = orch.schedule_task("missing").unwrap_err();
    assert!(matches!(err, HashbuildError::UnknownTask(name) if name == "missing"));
    assert!(orch.scheduled().is_empty());
}

#[test]
fn scheduling_twice_keeps_one_root() -> TestResult {
    let project = TestProject::new();
    let mut orch = project.orchestrator(1);
    orch.register_task(TaskDescriptor::builder("a").build())?;

    orch.schedule_task("a")?;
    orch.schedule_task("a")?;

    assert_eq!(orch.scheduled(), ["a".to_string()]);
    Ok(())
}
