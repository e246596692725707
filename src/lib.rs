// AppExport - application packaging and export engine
// Copyright (c) 2025 AppExport Contributors
// Licensed under the MIT License

//! # appexport - application packaging and export
//!
//! appexport turns an application manifest workspace into a single
//! distributable archive, either in the platform-native per-app layout or as
//! a generic docker-compose bundle.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Reading** two historical manifest shapes into one component model
//! - **Resolving** service names, environment inheritance and volume bindings
//! - **Staging** config files, container images and build artifacts
//! - **Describing** compose services in `docker-compose.yaml`
//! - **Archiving** the workspace, gated by a manifest checksum so unchanged
//!   manifests are not exported twice
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Export engine (naming, manifest, resolve, compose, export)
//! - [`adapters`] - Image service, artifact fetcher, status store, archiver
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and per-task event logs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use appexport::config::load_config;
//! use appexport::core::export::ExportCoordinator;
//! use appexport::domain::ExportRequest;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("appexport.toml")?;
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let coordinator = ExportCoordinator::from_config(config, shutdown_rx).await?;
//!
//!     let report = coordinator
//!         .execute(&ExportRequest {
//!             event_id: "task-1".to_string(),
//!             format: "rainbond-app".to_string(),
//!             source_dir: "/grdata/app/shop-1.0".into(),
//!         })
//!         .await?;
//!
//!     println!("Exported {} components", report.components);
//!     Ok(())
//! }
//! ```
//!
//! ## Resolving without exporting
//!
//! ```rust
//! use appexport::core::naming::ServiceNameRegistry;
//! use appexport::core::resolve::resolve;
//! use appexport::domain::{ApplicationManifest, Component, ShareId};
//!
//! let manifest = ApplicationManifest {
//!     app_name: "shop".to_string(),
//!     components: vec![Component {
//!         display_name: "web".to_string(),
//!         share_id: ShareId::new("w"),
//!         ..Default::default()
//!     }],
//!     plugins: Vec::new(),
//! };
//! let registry = ServiceNameRegistry::build(&manifest.components);
//! let resolved = resolve(&manifest, &registry);
//! assert_eq!(resolved.components[&ShareId::new("w")].service_name, "web");
//! ```
//!
//! ## Error Handling
//!
//! Fatal conditions are [`domain::AppExportError`] values; degradations the
//! resolver can work around are [`domain::ResolveWarning`] values carried in
//! the results.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
