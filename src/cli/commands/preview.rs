//! Preview command implementation
//!
//! Prints the compose descriptor a workspace would produce, without pulling
//! images or touching the workspace.

use crate::config::{load_config, ExportConfig};
use crate::core::export::preview_descriptor;
use clap::Args;
use std::path::PathBuf;

/// Arguments for the preview command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// Workspace directory holding metadata.json
    #[arg(long)]
    pub source_dir: PathBuf,

    /// Registry domain for flattened image names (overrides the config file)
    #[arg(long)]
    pub registry_domain: Option<String>,
}

impl PreviewArgs {
    /// Execute the preview command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(source_dir = %self.source_dir.display(), "Previewing descriptor");

        let registry_domain = match &self.registry_domain {
            Some(domain) => domain.clone(),
            // A missing config file falls back to the default domain
            None => load_config(config_path)
                .map(|c| c.export.registry_domain)
                .unwrap_or_else(|e| {
                    tracing::debug!(error = %e, "Using default registry domain");
                    ExportConfig::default().registry_domain
                }),
        };

        let preview = match preview_descriptor(&self.source_dir, &registry_domain) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to render descriptor: {e}");
                return Ok(e.exit_code());
            }
        };

        print!("{}", preview.yaml);
        for warning in &preview.warnings {
            eprintln!("⚠️  {warning}");
        }
        Ok(0)
    }
}
