//! Domain models and types
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`TaskId`], [`ShareId`])
//! - **Manifest model** ([`ApplicationManifest`], [`Component`], [`VolumeMount`],
//!   [`DependencyEdge`])
//! - **Task model** ([`ExportTask`], [`ExportFormat`], [`TaskStatus`], [`ExportRecord`])
//! - **Error types** ([`AppExportError`], [`ImageError`], [`ResolveWarning`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, AppExportError>`]:
//!
//! ```rust
//! use appexport::domain::{ExportFormat, Result};
//!
//! fn example() -> Result<ExportFormat> {
//!     "docker-compose".parse()
//! }
//! # assert!(example().is_ok());
//! ```

pub mod errors;
pub mod ids;
pub mod manifest;
pub mod result;
pub mod task;

// Re-export commonly used types for convenience
pub use errors::{AppExportError, ImageError, ResolveWarning};
pub use ids::{ShareId, TaskId};
pub use manifest::{
    ApplicationManifest, Component, DependencyEdge, EnvVar, PluginImage, RegistryCredentials,
    RemoteEndpoint, SlugArtifact, VolumeBinding, VolumeKind, VolumeMount,
    GENERATED_VALUE_PLACEHOLDER,
};
pub use result::Result;
pub use task::{
    ExportFormat, ExportRecord, ExportRequest, ExportTask, TaskStatus, CHECKSUM_FILE,
    MANIFEST_FILE,
};
