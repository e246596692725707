//! Export command implementation
//!
//! This module implements the `export` command: one task from flags, or a
//! batch of dispatcher requests from a JSON file.

use crate::config::load_config;
use crate::core::export::{ExportCoordinator, ExportReport};
use crate::domain::{AppExportError, ExportRequest, TaskId};
use anyhow::Context;
use clap::{ArgGroup, Args};
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["source_dir", "tasks"])))]
pub struct ExportArgs {
    /// Task identifier (generated when omitted)
    #[arg(long, requires = "source_dir")]
    pub task_id: Option<String>,

    /// Output format (rainbond-app or docker-compose)
    #[arg(long, requires = "source_dir")]
    pub format: Option<String>,

    /// Workspace directory holding metadata.json
    #[arg(long, requires = "format")]
    pub source_dir: Option<PathBuf>,

    /// JSON file with an array of {event_id, format, source_dir} requests
    #[arg(long, value_name = "FILE", conflicts_with_all = ["task_id", "format"])]
    pub tasks: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let requests = match self.requests() {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, "Invalid export request");
                eprintln!("Invalid export request: {e:#}");
                return Ok(2);
            }
        };

        let coordinator = match ExportCoordinator::from_config(config, shutdown_signal).await {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export coordinator");
                eprintln!("Failed to initialize export: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        println!("🚀 Starting export of {} task(s)...", requests.len());
        println!();

        let results = match coordinator.run_many(&requests).await {
            Ok(results) => results,
            Err(e) => {
                eprintln!("Export rejected: {e}");
                return Ok(e.exit_code());
            }
        };

        let mut exit_code = 0;
        for (request, result) in requests.iter().zip(&results) {
            match result {
                Ok(report) => print_report(report),
                Err(e) => {
                    println!("❌ Task {} failed: {e}", request.event_id);
                    println!();
                    exit_code = worst_exit_code(exit_code, e);
                }
            }
        }

        if exit_code == 130 {
            println!("⚠️  Export interrupted. Re-run the same command to start over.");
        } else if exit_code == 0 {
            println!("✅ Export completed successfully!");
        }

        Ok(exit_code)
    }

    /// Requests described by the flags or the batch file
    fn requests(&self) -> anyhow::Result<Vec<ExportRequest>> {
        if let Some(path) = &self.tasks {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading task file {}", path.display()))?;
            let requests: Vec<ExportRequest> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing task file {}", path.display()))?;
            anyhow::ensure!(!requests.is_empty(), "task file {} is empty", path.display());
            return Ok(requests);
        }

        let source_dir = self
            .source_dir
            .clone()
            .context("--source-dir is required without --tasks")?;
        let format = self
            .format
            .clone()
            .context("--format is required with --source-dir")?;
        let event_id = match &self.task_id {
            Some(id) => id.clone(),
            None => TaskId::generate().to_string(),
        };

        Ok(vec![ExportRequest {
            event_id,
            format,
            source_dir,
        }])
    }
}

/// Interrupted beats fatal beats everything else
fn worst_exit_code(current: i32, error: &AppExportError) -> i32 {
    let code = error.exit_code();
    if current == 130 || code == 130 {
        130
    } else {
        current.max(code)
    }
}

fn print_report(report: &ExportReport) {
    println!("📦 Task {} ({})", report.task_id, report.format);
    if report.cached {
        println!("  Up to date, archive reused");
    } else {
        println!("  Components: {}", report.components);
        println!("  Images saved: {}", report.images_saved);
        if report.artifacts_copied > 0 {
            println!("  Build artifacts: {}", report.artifacts_copied);
        }
    }
    println!("  Archive: {}", report.archive_path.display());
    println!("  Duration: {:.2}s", report.duration.as_secs_f64());
    if !report.status_persisted {
        println!("  ⚠️  Status could not be recorded in the status store");
    }
    for warning in &report.warnings {
        println!("  ⚠️  {warning}");
    }
    println!();
}
