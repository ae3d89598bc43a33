//! Integration tests for the text-extraction sandbox
//!
//! These drive the parent side against small shell-script workers so the
//! protocol, timeout and noise handling are exercised without a real PDF
//! parser in the loop.

#![cfg(unix)]

use fisiopay_sandbox::{ExtractionError, TextSandbox};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Write an executable fake worker script
fn fake_worker(dir: &TempDir, name: &str, script: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, script).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

fn sandbox(worker: PathBuf) -> TextSandbox {
    TextSandbox::new(worker, Duration::from_secs(5))
}

#[tokio::test]
async fn test_successful_extraction() {
    let dir = TempDir::new().unwrap();
    let worker = fake_worker(
        &dir,
        "ok-worker",
        "#!/bin/sh\ncat <<'EOF'\n{\"success\":true,\"text\":\"page one\\npage two\"}\nEOF\n",
    );

    let text = sandbox(worker)
        .extract_text(Path::new("/tmp/input.pdf"))
        .await
        .unwrap();
    assert_eq!(text, "page one\npage two");
}

#[tokio::test]
async fn test_noise_around_protocol_line_is_tolerated() {
    let dir = TempDir::new().unwrap();
    let worker = fake_worker(
        &dir,
        "noisy-worker",
        "#!/bin/sh\necho 'WARN: stray library output'\n\
         cat <<'EOF'\n{\"success\":true,\"text\":\"clean\"}\nEOF\n",
    );

    let text = sandbox(worker)
        .extract_text(Path::new("/tmp/input.pdf"))
        .await
        .unwrap();
    assert_eq!(text, "clean");
}

#[tokio::test]
async fn test_worker_error_is_surfaced() {
    let dir = TempDir::new().unwrap();
    let worker = fake_worker(
        &dir,
        "err-worker",
        "#!/bin/sh\necho '{\"error\":\"not a valid PDF\"}'\nexit 1\n",
    );

    let result = sandbox(worker)
        .extract_text(Path::new("/tmp/input.pdf"))
        .await;
    match result {
        Err(ExtractionError::Worker(msg)) => assert_eq!(msg, "not a valid PDF"),
        other => panic!("expected Worker error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_garbage_output_is_malformed() {
    let dir = TempDir::new().unwrap();
    let worker = fake_worker(
        &dir,
        "garbage-worker",
        "#!/bin/sh\necho 'definitely not json'\nexit 1\n",
    );

    let result = sandbox(worker)
        .extract_text(Path::new("/tmp/input.pdf"))
        .await;
    assert!(matches!(result, Err(ExtractionError::MalformedOutput)));
}

#[tokio::test]
async fn test_timeout_kills_worker_and_discards_partial_text() {
    let dir = TempDir::new().unwrap();
    // Emits a plausible-looking line, then hangs: the partial output must
    // never be accepted
    let worker = fake_worker(
        &dir,
        "slow-worker",
        "#!/bin/sh\necho '{\"success\":true,\"text\":\"partial\"}'\nexec sleep 30\n",
    );

    let sandbox = TextSandbox::new(worker, Duration::from_millis(300));
    let started = std::time::Instant::now();
    let result = sandbox.extract_text(Path::new("/tmp/input.pdf")).await;

    assert!(matches!(result, Err(ExtractionError::Timeout)));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "worker was not killed promptly"
    );
}

#[tokio::test]
async fn test_empty_output_is_malformed() {
    let dir = TempDir::new().unwrap();
    let worker = fake_worker(&dir, "silent-worker", "#!/bin/sh\nexit 1\n");

    let result = sandbox(worker)
        .extract_text(Path::new("/tmp/input.pdf"))
        .await;
    assert!(matches!(result, Err(ExtractionError::MalformedOutput)));
}
