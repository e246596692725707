//! Export orchestration
//!
//! This module provides the pipeline that turns a manifest workspace into a
//! distributable archive:
//! - Stage machine and transition rules ([`stage`])
//! - Artifact staging for both output formats ([`staging`])
//! - Coordination, freshness gate and status updates ([`coordinator`])
//! - Reporting ([`summary`]) and descriptor preview ([`preview`])

pub mod coordinator;
pub mod preview;
pub mod stage;
pub mod staging;
pub mod summary;
pub mod workspace;

pub use coordinator::{ExportCoordinator, STARTUP_SCRIPT_FILE};
pub use preview::{preview_descriptor, DescriptorPreview};
pub use stage::{ExportStage, StageTracker};
pub use staging::{Stager, StagingOutcome, BULK_IMAGE_ARCHIVE};
pub use summary::ExportReport;
