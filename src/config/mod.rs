//! Configuration management
//!
//! TOML configuration with `${VAR_NAME}` substitution, `APPEXPORT_*`
//! environment overrides and validation on load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use appexport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("appexport.toml")?;
//! println!("Registry: {}", config.export.registry_domain);
//! println!("Status target: {:?}", config.status.target);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - log level
//! - [`ExportConfig`] - registry domain, runner marker, attempt budgets,
//!   startup script override, archive extension
//! - [`DockerConfig`] - runtime binary and command timeout
//! - [`StatusConfig`] - status store backend
//! - [`PostgreSQLConfig`] - status database (postgresql backend only)
//! - [`ArtifactsConfig`] - remote build-artifact downloads
//! - [`EventsConfig`] - per-task event log
//! - [`LoggingConfig`] - logging configuration
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! registry_domain = "goodrain.me"
//! pull_attempts = 2
//!
//! [status]
//! target = "postgresql"
//!
//! [postgresql]
//! connection_string = "${APPEXPORT_DB_URL}"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_str};
pub use schema::{
    AppExportConfig, ApplicationConfig, ArtifactsConfig, DockerConfig, EventsConfig, ExportConfig,
    LoggingConfig, PostgreSQLConfig, StatusConfig, StatusTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
