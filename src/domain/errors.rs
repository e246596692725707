//! Domain error types
//!
//! This module defines the error hierarchy for the export engine.
//! Fatal conditions are `AppExportError` variants; non-fatal degradations
//! (a dependency volume that cannot be bound, a dependency target that does
//! not exist) are [`ResolveWarning`] values carried alongside the results.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type
///
/// Every fatal error aborts the running export and drives the task to
/// `Failed`.
#[derive(Debug, Error)]
pub enum AppExportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The manifest file is missing or cannot be read
    #[error("Manifest unavailable at {}: {reason}", path.display())]
    ManifestUnavailable {
        /// Path of the manifest that was requested
        path: PathBuf,
        /// Underlying reason
        reason: String,
    },

    /// The manifest content does not have the expected shape
    #[error("Manifest malformed: {0}")]
    ManifestMalformed(String),

    /// The requested output format is not one of the known values
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Image pull/tag/save failed
    #[error("Image operation failed: {0}")]
    ImageOperationFailed(#[from] ImageError),

    /// Fetching a remote build artifact failed
    #[error("Remote artifact fetch failed: {0}")]
    RemoteFetch(String),

    /// Compressing the workspace failed
    #[error("Archival failed: {0}")]
    ArchivalFailed(String),

    /// Writing the terminal status to the status store failed
    #[error("Status persist failed: {0}")]
    StatusPersistFailed(String),

    /// Workspace preparation errors
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// A shutdown signal stopped the export between stages
    #[error("Export interrupted: {0}")]
    Interrupted(String),
}

/// Image-transfer errors
///
/// Raised by [`crate::adapters::image::ImageService`] implementations.
/// These errors don't expose the container runtime's own error types.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Pulling the source image failed after all attempts
    #[error("Failed to pull {image} after {attempts} attempt(s): {message}")]
    PullFailed {
        image: String,
        attempts: u32,
        message: String,
    },

    /// Tagging the flattened copy failed after all attempts
    #[error("Failed to tag {source_image} as {target}: {message}")]
    TagFailed {
        source_image: String,
        target: String,
        message: String,
    },

    /// Saving one or more images to disk failed
    #[error("Failed to save {images} to {dest}: {message}")]
    SaveFailed {
        images: String,
        dest: String,
        message: String,
    },

    /// Registry login failed
    #[error("Registry login failed for {registry}: {message}")]
    LoginFailed { registry: String, message: String },

    /// A runtime command exceeded its time budget
    #[error("Command timed out: {0}")]
    Timeout(String),

    /// The runtime binary could not be started
    #[error("Container runtime unavailable: {0}")]
    CommandUnavailable(String),
}

/// Non-fatal resolution problems
///
/// The resolver never fails; anything it has to skip is reported here and
/// logged as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveWarning {
    /// A dependency edge requested a volume its target never declared
    VolumeBindingUnresolved {
        component: String,
        target: String,
        volume: String,
    },

    /// A dependency edge names a share identifier absent from the manifest
    DependencyMissing { component: String, target: String },
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveWarning::VolumeBindingUnresolved {
                component,
                target,
                volume,
            } => write!(
                f,
                "dependent volume {target}/{volume} requested by {component} not found"
            ),
            ResolveWarning::DependencyMissing { component, target } => {
                write!(f, "dependency {target} of {component} not found in manifest")
            }
        }
    }
}

impl AppExportError {
    /// Exit code the CLI reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            AppExportError::Configuration(_) | AppExportError::UnsupportedFormat(_) => 2,
            AppExportError::ImageOperationFailed(_)
            | AppExportError::RemoteFetch(_)
            | AppExportError::StatusPersistFailed(_) => 4,
            AppExportError::Interrupted(_) => 130,
            _ => 5,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for AppExportError {
    fn from(err: std::io::Error) -> Self {
        AppExportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for AppExportError {
    fn from(err: serde_json::Error) -> Self {
        AppExportError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppExportError {
    fn from(err: serde_yaml::Error) -> Self {
        AppExportError::Serialization(format!("YAML: {err}"))
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for AppExportError {
    fn from(err: toml::de::Error) -> Self {
        AppExportError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppExportError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_manifest_unavailable_display() {
        let err = AppExportError::ManifestUnavailable {
            path: PathBuf::from("/data/app/metadata.json"),
            reason: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Manifest unavailable at /data/app/metadata.json: not found"
        );
    }

    #[test]
    fn test_image_error_conversion() {
        let image_err = ImageError::Timeout("docker pull nginx".to_string());
        let err: AppExportError = image_err.into();
        assert!(matches!(err, AppExportError::ImageOperationFailed(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: AppExportError = io_err.into();
        assert!(matches!(err, AppExportError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: AppExportError = json_err.into();
        assert!(matches!(err, AppExportError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: AppExportError = toml_err.into();
        assert!(matches!(err, AppExportError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            AppExportError::UnsupportedFormat("tarball".into()).exit_code(),
            2
        );
        assert_eq!(AppExportError::ArchivalFailed("disk".into()).exit_code(), 5);
        assert_eq!(AppExportError::Interrupted("signal".into()).exit_code(), 130);
    }

    #[test]
    fn test_resolve_warning_display() {
        let warning = ResolveWarning::VolumeBindingUnresolved {
            component: "web".to_string(),
            target: "db-share".to_string(),
            volume: "logs".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "dependent volume db-share/logs requested by web not found"
        );
    }
}
