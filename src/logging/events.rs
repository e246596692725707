//! Per-task event log
//!
//! Operator-facing progress messages for one export task. Events always go
//! to `tracing`; with `[events].enabled` they are also appended as JSON
//! lines to `<directory>/<task_id>.log`. Event logging never fails an
//! export: write errors are reported through `tracing` and dropped.

use crate::config::EventsConfig;
use crate::domain::ids::TaskId;
use chrono::Utc;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Info,
    Error,
}

/// Receives progress events for one task
pub trait EventLogger: Send + Sync {
    fn log(&self, level: EventLevel, message: &str, fields: &[(&str, &str)]);

    fn info(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(EventLevel::Info, message, fields);
    }

    fn error(&self, message: &str, fields: &[(&str, &str)]) {
        self.log(EventLevel::Error, message, fields);
    }
}

/// Forwards events to `tracing` tagged with the task id
#[derive(Debug, Clone)]
pub struct TracingEventLogger {
    task_id: String,
}

impl TracingEventLogger {
    pub fn new(task_id: &TaskId) -> Self {
        Self {
            task_id: task_id.to_string(),
        }
    }
}

impl EventLogger for TracingEventLogger {
    fn log(&self, level: EventLevel, message: &str, fields: &[(&str, &str)]) {
        let fields = render_fields(fields);
        match level {
            EventLevel::Info => {
                tracing::info!(task_id = %self.task_id, fields = %fields, "{message}")
            }
            EventLevel::Error => {
                tracing::error!(task_id = %self.task_id, fields = %fields, "{message}")
            }
        }
    }
}

#[derive(Serialize)]
struct EventLine<'a> {
    timestamp: String,
    task_id: &'a str,
    level: EventLevel,
    message: &'a str,
    fields: serde_json::Map<String, serde_json::Value>,
}

/// Appends JSON lines to a per-task file, and forwards to `tracing`
#[derive(Debug)]
pub struct JsonLinesEventLogger {
    inner: TracingEventLogger,
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonLinesEventLogger {
    pub fn new(task_id: &TaskId, directory: &Path) -> Self {
        Self {
            inner: TracingEventLogger::new(task_id),
            path: directory.join(format!("{}.log", task_id)),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &EventLine<'_>) -> std::io::Result<()> {
        let mut data = serde_json::to_vec(line)?;
        data.push(b'\n');

        // A poisoned lock only means another writer panicked mid-line
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&data)
    }
}

impl EventLogger for JsonLinesEventLogger {
    fn log(&self, level: EventLevel, message: &str, fields: &[(&str, &str)]) {
        self.inner.log(level, message, fields);

        let line = EventLine {
            timestamp: Utc::now().to_rfc3339(),
            task_id: &self.inner.task_id,
            level,
            message,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                .collect(),
        };
        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to write event log");
        }
    }
}

/// Hands out one event logger per task
#[derive(Debug, Clone)]
pub struct EventSink {
    directory: Option<PathBuf>,
}

impl EventSink {
    /// Events go to `tracing` only
    pub fn tracing_only() -> Self {
        Self { directory: None }
    }

    pub fn from_config(config: &EventsConfig) -> Self {
        Self {
            directory: config.enabled.then(|| config.directory.clone()),
        }
    }

    pub fn logger_for(&self, task_id: &TaskId) -> Arc<dyn EventLogger> {
        match &self.directory {
            Some(directory) => Arc::new(JsonLinesEventLogger::new(task_id, directory)),
            None => Arc::new(TracingEventLogger::new(task_id)),
        }
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::tracing_only()
    }
}

fn render_fields(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}
