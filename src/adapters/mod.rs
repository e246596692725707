//! Collaborator adapters.
//!
//! The engine talks to the outside world only through the traits defined
//! here:
//!
//! - [`image`] - container image pull/tag/save ([`image::ImageService`])
//! - [`remote`] - build artifact download ([`remote::RemoteFileFetcher`])
//! - [`status`] - terminal task status ([`status::StatusStore`])
//! - [`archive`] - workspace compression ([`archive::Archiver`])
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies and let tests swap in fakes. The
//! production implementations are built from configuration:
//!
//! ```rust,no_run
//! use appexport::adapters::status::create_status_store;
//! use appexport::config::AppExportConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppExportConfig::default();
//! let store = create_status_store(&config).await?;
//! let record = store.get_by_task_id("task-1").await?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod image;
pub mod remote;
pub mod status;
