// tests/content_hashing.rs

mod common;
use crate::common::{TestProject, TestResult, init_tracing, with_timeout};

use std::path::Path;
use std::sync::Arc;

use hashbuild::cache::{ContentHasher, Digest, FileDigest, task_digest};
use hashbuild::task::TaskDescriptor;
use serde_json::json;

#[tokio::test]
async fn missing_file_hashes_as_absent() {
    init_tracing();
    let project = TestProject::new();
    let hasher = ContentHasher::new(project.root());

    let digest = hasher.digest_of(Path::new("nope.txt")).await;
    assert_eq!(digest, FileDigest::Absent);
}

#[tokio::test]
async fn digest_matches_file_contents() {
    let project = TestProject::new();
    project.write("a.txt", "hello");
    let hasher = ContentHasher::new(project.root());

    let digest = hasher.digest_of(Path::new("a.txt")).await;
    assert_eq!(digest, FileDigest::Present(Digest::of_bytes(b"hello")));
}

#[tokio::test]
async fn digests_are_memoized_until_invalidated() {
    let project = TestProject::new();
    project.write("a.txt", "one");
    let hasher = ContentHasher::new(project.root());
    let path = Path::new("a.txt");

    let first = hasher.digest_of(path).await;
    project.write("a.txt", "two");
    assert_eq!(hasher.digest_of(path).await, first);

    hasher.invalidate(path);
    let second = hasher.digest_of(path).await;
    assert_eq!(second, FileDigest::Present(Digest::of_bytes(b"two")));
    assert_ne!(first, second);
}

#[tokio::test]
async fn reset_forgets_everything() {
    let project = TestProject::new();
    project.write("a.txt", "one");
    project.write("b.txt", "two");
    let hasher = ContentHasher::new(project.root());

    hasher.digest_of(Path::new("a.txt")).await;
    hasher.digest_of(Path::new("b.txt")).await;
    assert_eq!(hasher.len(), 2);

    hasher.reset();
    assert!(hasher.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_one_entry() {
    let project = TestProject::new();
    project.write("shared.txt", &"x".repeat(100_000));
    let hasher = Arc::new(ContentHasher::new(project.root()));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let hasher = Arc::clone(&hasher);
        handles.push(tokio::spawn(async move {
            hasher.digest_of(Path::new("shared.txt")).await
        }));
    }

    let mut digests = Vec::new();
    for handle in handles {
        digests.push(handle.await.unwrap());
    }

    assert!(digests.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(hasher.len(), 1);
}

/// A FIFO hands its bytes to exactly one reader; any second open would block
/// waiting for a writer that never comes back.
#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_read_the_file_once() -> TestResult {
    use std::io::Write;

    init_tracing();
    let project = TestProject::new();
    let fifo = project.path("once.pipe");
    let status = std::process::Command::new("mkfifo").arg(&fifo).status()?;
    assert!(status.success());

    let writer = std::thread::spawn({
        let fifo = fifo.clone();
        move || -> std::io::Result<()> {
            let mut pipe = std::fs::OpenOptions::new().write(true).open(&fifo)?;
            pipe.write_all(b"streamed once")?;
            Ok(())
        }
    });

    let hasher = Arc::new(ContentHasher::new(project.root()));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let hasher = Arc::clone(&hasher);
        handles.push(tokio::spawn(async move {
            hasher.digest_of(Path::new("once.pipe")).await
        }));
    }

    let digests = with_timeout(async {
        let mut digests = Vec::new();
        for handle in handles {
            digests.push(handle.await.unwrap());
        }
        digests
    })
    .await;
    writer.join().unwrap()?;

    assert_eq!(digests.len(), 8);
    assert!(digests.iter().all(|d| *d == present(b"streamed once")));
    assert_eq!(hasher.len(), 1);
    Ok(())
}

fn present(bytes: &[u8]) -> FileDigest {
    FileDigest::Present(Digest::of_bytes(bytes))
}

#[test]
fn task_digest_is_stable() {
    let task = TaskDescriptor::builder("compile")
        .read("a.src")
        .write("a.out")
        .plugin("upper")
        .build();

    let one = task_digest(&task, &[present(b"hello")]).unwrap();
    let two = task_digest(&task, &[present(b"hello")]).unwrap();
    assert_eq!(one, two);
    assert_eq!(one.to_hex().len(), 64);
}

#[test]
fn task_digest_depends_on_every_component() {
    let base = TaskDescriptor::builder("compile")
        .read("a.src")
        .plugin("upper")
        .build();
    let key = task_digest(&base, &[present(b"hello")]).unwrap();

    let renamed = TaskDescriptor::builder("compile2")
        .read("a.src")
        .plugin("upper")
        .build();
    assert_ne!(task_digest(&renamed, &[present(b"hello")]).unwrap(), key);

    let other_plugin = TaskDescriptor::builder("compile")
        .read("a.src")
        .plugin("lower")
        .build();
    assert_ne!(task_digest(&other_plugin, &[present(b"hello")]).unwrap(), key);

    let with_options = TaskDescriptor::builder("compile")
        .read("a.src")
        .plugin("upper")
        .options(json!({ "level": 2 }))
        .build();
    assert_ne!(task_digest(&with_options, &[present(b"hello")]).unwrap(), key);

    assert_ne!(task_digest(&base, &[present(b"world")]).unwrap(), key);
    assert_ne!(task_digest(&base, &[FileDigest::Absent]).unwrap(), key);
}

#[test]
fn task_digest_ignores_writes() {
    let a = TaskDescriptor::builder("t").read("in").write("x").build();
    let b = TaskDescriptor::builder("t").read("in").write("y").build();

    assert_eq!(
        task_digest(&a, &[present(b"1")]).unwrap(),
        task_digest(&b, &[present(b"1")]).unwrap()
    );
}

#[test]
fn task_digest_is_order_sensitive() {
    let ab = TaskDescriptor::builder("t").read("a").read("b").build();
    let ba = TaskDescriptor::builder("t").read("b").read("a").build();

    let inputs = [present(b"A"), present(b"B")];
    assert_ne!(
        task_digest(&ab, &inputs).unwrap(),
        task_digest(&ba, &[present(b"B"), present(b"A")]).unwrap()
    );
}
