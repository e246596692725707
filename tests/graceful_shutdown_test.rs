//! Integration tests for graceful shutdown
//!
//! These tests verify that:
//! - Shutdown signals propagate to every receiver
//! - A running export stops at the next stage boundary
//! - Interrupted tasks are recorded as failed and leave no archive
//! - Re-running an interrupted task starts over and succeeds

mod common;

use appexport::domain::{AppExportError, TaskStatus};
use common::*;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::watch;

#[tokio::test]
async fn test_shutdown_signal_propagation() {
    let (shutdown_tx, shutdown_rx1) = watch::channel(false);
    let shutdown_rx2 = shutdown_rx1.clone();

    assert!(!*shutdown_rx1.borrow());
    assert!(!*shutdown_rx2.borrow());

    shutdown_tx.send(true).unwrap();

    assert!(*shutdown_rx1.borrow());
    assert!(*shutdown_rx2.borrow());
}

#[tokio::test]
async fn test_shutdown_during_staging_stops_before_archiving() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");
    let ws = workspace(&work, "shop-1.0", COMPOSE_MANIFEST);
    let status_path = dir.path().join("status.json");

    // Signal flips as soon as the first image is pulled
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let images = Arc::new(FakeImages {
        on_pull: Some(shutdown_tx),
        ..Default::default()
    });
    let coordinator = coordinator(images, &status_path).with_shutdown_signal(shutdown_rx);

    let err = coordinator
        .execute(&request("task-int", "docker-compose", &ws))
        .await
        .unwrap_err();

    assert!(matches!(err, AppExportError::Interrupted(_)));
    assert_eq!(err.exit_code(), 130);
    assert!(!work.join("shop-1.0.tar.gz").exists());
    assert!(!ws.join("metadata.json.md5").exists());

    let record = coordinator
        .status_store()
        .get_by_task_id("task-int")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, TaskStatus::Failed);
}

#[tokio::test]
async fn test_rerun_after_interruption_succeeds() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");
    let ws = workspace(&work, "shop-1.0", COMPOSE_MANIFEST);
    let status_path = dir.path().join("status.json");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interrupted = coordinator(
        Arc::new(FakeImages {
            on_pull: Some(shutdown_tx),
            ..Default::default()
        }),
        &status_path,
    )
    .with_shutdown_signal(shutdown_rx);
    assert!(interrupted
        .execute(&request("task-again", "docker-compose", &ws))
        .await
        .is_err());

    let (_quiet_tx, quiet_rx) = watch::channel(false);
    let coordinator =
        coordinator(Arc::new(FakeImages::default()), &status_path).with_shutdown_signal(quiet_rx);
    let report = coordinator
        .execute(&request("task-again", "docker-compose", &ws))
        .await
        .unwrap();

    assert!(report.is_successful());
    assert!(!report.cached);
    assert!(work.join("shop-1.0.tar.gz").is_file());

    let record = coordinator
        .status_store()
        .get_by_task_id("task-again")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, TaskStatus::Success);
}

#[tokio::test]
async fn test_batch_interruption_affects_every_task() {
    let dir = TempDir::new().unwrap();
    let work = dir.path().join("work");
    let first = workspace(&work, "shop-1.0", COMPOSE_MANIFEST);
    let second = workspace(&work, "shop-1.1", COMPOSE_MANIFEST);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();
    let coordinator = coordinator(
        Arc::new(FakeImages::default()),
        &dir.path().join("status.json"),
    )
    .with_shutdown_signal(shutdown_rx);

    let results = coordinator
        .run_many(&[
            request("task-a", "docker-compose", &first),
            request("task-b", "rainbond-app", &second),
        ])
        .await
        .unwrap();

    for result in results {
        assert!(matches!(result, Err(AppExportError::Interrupted(_))));
    }
}
