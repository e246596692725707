//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the appexport configuration file.

use crate::adapters::status::PostgresStatusStore;
use crate::config::{load_config, StatusTarget};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after substitution and overrides
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Registry Domain: {}", config.export.registry_domain);
        println!("  Runner Marker: {}", config.export.runner_image_marker);
        println!(
            "  Attempts (pull/tag): {}/{}",
            config.export.pull_attempts, config.export.tag_attempts
        );
        println!("  Archive Extension: {}", config.export.archive_extension());
        match &config.export.startup_script {
            Some(path) => println!("  Startup Script: {}", path.display()),
            None => println!("  Startup Script: built-in"),
        }
        println!(
            "  Docker: {} (timeout {}s)",
            config.docker.binary, config.docker.command_timeout_secs
        );

        match config.status.target {
            StatusTarget::File => {
                println!("  Status Store: file ({})", config.status.path.display());
            }
            StatusTarget::PostgreSQL => {
                if let Some(pg_config) = &config.postgresql {
                    println!("  Status Store: postgresql (table {})", pg_config.table);
                    if let Ok(store) = PostgresStatusStore::new(pg_config.clone()).await {
                        println!("  PostgreSQL Connection: {}", store.connection_string_safe());
                    }
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!(
            "  Artifacts: {}:// (timeout {}s)",
            config.artifacts.scheme, config.artifacts.timeout_seconds
        );
        if config.events.enabled {
            println!("  Event Logs: {}", config.events.directory.display());
        }
        println!();
        Ok(0)
    }
}
