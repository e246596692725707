//! Export report
//!
//! Every run of the pipeline, cached or not, produces an [`ExportReport`].

use crate::core::export::stage::ExportStage;
use crate::domain::errors::ResolveWarning;
use crate::domain::ids::TaskId;
use crate::domain::task::{ExportFormat, TaskStatus};
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one export task
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub task_id: TaskId,

    pub format: ExportFormat,

    /// Terminal status held in memory, independent of `status_persisted`
    pub status: TaskStatus,

    /// The freshness gate short-circuited the run
    pub cached: bool,

    /// Legacy app records or structured components staged
    pub components: usize,

    /// Image tarballs written (the bulk archive counts every image in it)
    pub images_saved: usize,

    /// Slug artifacts copied or downloaded
    pub artifacts_copied: usize,

    pub warnings: Vec<ResolveWarning>,

    pub archive_path: PathBuf,

    pub duration: Duration,

    /// Whether the terminal status update reached the status store
    pub status_persisted: bool,

    /// Stages visited, in order
    pub stages: Vec<ExportStage>,

    /// Message of the error that failed the task
    pub error: Option<String>,
}

impl ExportReport {
    pub fn new(task_id: TaskId, format: ExportFormat, archive_path: PathBuf) -> Self {
        Self {
            task_id,
            format,
            status: TaskStatus::Running,
            cached: false,
            components: 0,
            images_saved: 0,
            artifacts_copied: 0,
            warnings: Vec::new(),
            archive_path,
            duration: Duration::ZERO,
            status_persisted: false,
            stages: Vec::new(),
            error: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Success
    }

    /// Stage path rendered as `a -> b -> c`
    pub fn stage_path(&self) -> String {
        self.stages
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn log_summary(&self) {
        tracing::info!(
            task_id = %self.task_id,
            format = %self.format,
            status = %self.status,
            cached = self.cached,
            components = self.components,
            images_saved = self.images_saved,
            artifacts_copied = self.artifacts_copied,
            warnings = self.warnings.len(),
            archive = %self.archive_path.display(),
            duration_ms = self.duration.as_millis() as u64,
            status_persisted = self.status_persisted,
            stages = %self.stage_path(),
            "Export finished"
        );

        for warning in &self.warnings {
            tracing::warn!(task_id = %self.task_id, warning = %warning, "Export warning");
        }

        if !self.status_persisted {
            tracing::warn!(
                task_id = %self.task_id,
                status = %self.status,
                "Terminal status was not persisted; status store readers will not see this outcome"
            );
        }
    }
}
