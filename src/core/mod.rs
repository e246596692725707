//! Core export engine.
//!
//! # Modules
//!
//! - [`naming`] - Escape decoding, identifier transliteration, collision-free service names
//! - [`manifest`] - Reading both manifest shapes into one component model
//! - [`resolve`] - Dependency, environment and volume resolution
//! - [`compose`] - Compose descriptor builder
//! - [`verification`] - Checksum sidecar and freshness gate
//! - [`export`] - Stage machine, staging and coordination
//!
//! # Export Workflow
//!
//! 1. **Freshness**: skip everything when the manifest sidecar verifies and the archive exists
//! 2. **Clean**: reset the workspace to just the manifest
//! 3. **Stage**: write config files, image tarballs and build artifacts
//! 4. **Describe** (compose only): write `docker-compose.yaml` and `run.sh`
//! 5. **Archive**: compress the workspace, then rewrite the sidecar
//! 6. **Report**: persist the terminal status and return an [`export::ExportReport`]
//!
//! # Example
//!
//! ```rust,no_run
//! use appexport::config::load_config;
//! use appexport::core::export::ExportCoordinator;
//! use appexport::domain::ExportRequest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("appexport.toml")?;
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let coordinator = ExportCoordinator::from_config(config, shutdown_rx).await?;
//!
//! let report = coordinator
//!     .execute(&ExportRequest {
//!         event_id: "task-1".to_string(),
//!         format: "docker-compose".to_string(),
//!         source_dir: "/grdata/app/shop-1.0".into(),
//!     })
//!     .await?;
//!
//! println!("Archive: {}", report.archive_path.display());
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod export;
pub mod manifest;
pub mod naming;
pub mod resolve;
pub mod verification;
