//! Logging and observability
//!
//! This module provides:
//! - Structured logging with configurable levels ([`init_logging`])
//! - JSON file logging with rotation
//! - Per-task event logs ([`EventSink`], [`EventLogger`])
//!
//! # Example
//!
//! ```no_run
//! use appexport::logging::init_logging;
//! use appexport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! tracing::error!(error = "Something went wrong", "Error occurred");
//! ```

pub mod events;
pub mod structured;

pub use events::{EventLevel, EventLogger, EventSink, JsonLinesEventLogger, TracingEventLogger};
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an export task
///
/// # Example
///
/// ```no_run
/// use appexport::log_export_start;
/// use appexport::domain::{ExportFormat, TaskId};
///
/// let task_id = TaskId::new("task-1").unwrap();
/// log_export_start!(&task_id, ExportFormat::Compose);
/// ```
#[macro_export]
macro_rules! log_export_start {
    ($task_id:expr, $format:expr) => {
        tracing::info!(
            task_id = %$task_id,
            format = %$format,
            "Starting export"
        );
    };
}

/// Log the completion of an export task
///
/// # Example
///
/// ```no_run
/// use appexport::log_export_complete;
/// use std::time::Duration;
///
/// log_export_complete!("task-1", 3, Duration::from_secs(10));
/// ```
#[macro_export]
macro_rules! log_export_complete {
    ($task_id:expr, $components:expr, $duration:expr) => {
        tracing::info!(
            task_id = %$task_id,
            components = $components,
            duration_ms = $duration.as_millis() as u64,
            "Export completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use appexport::log_error_with_context;
/// use appexport::domain::AppExportError;
///
/// let error = AppExportError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use appexport::log_retry_attempt;
///
/// log_retry_attempt!(1, 2, "manifest unknown");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = $reason,
            "Retrying operation"
        );
    };
}
