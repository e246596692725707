//! Export task model
//!
//! An [`ExportTask`] is created from a dispatcher request, mutated only by the
//! export coordinator, and persisted as an [`ExportRecord`] on each terminal
//! transition.

use crate::domain::errors::AppExportError;
use crate::domain::ids::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Manifest file name inside every workspace
pub const MANIFEST_FILE: &str = "metadata.json";

/// Checksum sidecar file name
pub const CHECKSUM_FILE: &str = "metadata.json.md5";

/// Requested output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    /// Per-app directory tree with platform metadata
    #[serde(rename = "rainbond-app")]
    PlatformNative,
    /// Generic multi-container compose bundle
    #[serde(rename = "docker-compose")]
    Compose,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::PlatformNative => "rainbond-app",
            ExportFormat::Compose => "docker-compose",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AppExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rainbond-app" => Ok(ExportFormat::PlatformNative),
            "docker-compose" => Ok(ExportFormat::Compose),
            other => Err(AppExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Task status as persisted in the status store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Running,
    Success,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Running => "running",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is allowed
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Running)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(TaskStatus::Running),
            "success" => Ok(TaskStatus::Success),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(format!("Unknown task status '{other}'")),
        }
    }
}

/// Dispatcher request body
///
/// The format is kept as a raw string so that an unknown value can still be
/// recorded as a failed task rather than rejected at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub event_id: String,
    pub format: String,
    pub source_dir: PathBuf,
}

/// The unit of work
#[derive(Debug, Clone)]
pub struct ExportTask {
    pub id: TaskId,
    pub format: ExportFormat,
    pub source_dir: PathBuf,
    pub status: TaskStatus,
}

impl ExportTask {
    /// Creates a running task
    pub fn new(id: TaskId, format: ExportFormat, source_dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            format,
            source_dir: source_dir.into(),
            status: TaskStatus::Running,
        }
    }

    /// Workspace directory (the source directory itself)
    pub fn workspace(&self) -> &Path {
        &self.source_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.source_dir.join(MANIFEST_FILE)
    }

    pub fn checksum_path(&self) -> PathBuf {
        self.source_dir.join(CHECKSUM_FILE)
    }

    /// Archive path: the workspace path plus `.<extension>`
    pub fn archive_path(&self, extension: &str) -> PathBuf {
        let raw = self.source_dir.to_string_lossy();
        // A trailing separator would put the archive inside the workspace
        let base = raw.trim_end_matches('/');
        PathBuf::from(format!("{}.{}", base, extension.trim_start_matches('.')))
    }

    pub fn mark_succeeded(&mut self) {
        self.status = TaskStatus::Success;
    }

    pub fn mark_failed(&mut self) {
        self.status = TaskStatus::Failed;
    }

    /// Snapshot for the status store
    pub fn record(&self) -> ExportRecord {
        ExportRecord {
            task_id: self.id.to_string(),
            format: self.format.to_string(),
            source_dir: self.source_dir.clone(),
            status: self.status,
            updated_at: Utc::now(),
        }
    }
}

/// Persisted status record, keyed by task id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub task_id: String,
    pub format: String,
    pub source_dir: PathBuf,
    pub status: TaskStatus,
    pub updated_at: DateTime<Utc>,
}

impl ExportRecord {
    /// Record for a request whose format could not be parsed
    pub fn failed_request(task_id: &TaskId, format: &str, source_dir: &Path) -> Self {
        Self {
            task_id: task_id.to_string(),
            format: format.to_string(),
            source_dir: source_dir.to_path_buf(),
            status: TaskStatus::Failed,
            updated_at: Utc::now(),
        }
    }
}
