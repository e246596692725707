//! Status command implementation
//!
//! This module implements the `status` command for displaying the recorded
//! outcome of an export task.

use crate::adapters::status::create_status_store;
use crate::config::load_config;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Task identifier to look up
    #[arg(long)]
    pub task_id: String,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(task_id = %self.task_id, "Checking export status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        let store = match create_status_store(&config).await {
            Ok(s) => s,
            Err(e) => {
                println!("❌ Failed to open status store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let record = match store.get_by_task_id(&self.task_id).await {
            Ok(r) => r,
            Err(e) => {
                println!("❌ Failed to read status");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        match record {
            Some(record) => {
                println!("📊 Export Status");
                println!();
                println!("  Task: {}", record.task_id);
                println!("  Format: {}", record.format);
                println!("  Source: {}", record.source_dir.display());
                println!("  Status: {}", record.status);
                println!(
                    "  Updated: {}",
                    record.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
                Ok(0)
            }
            None => {
                println!("No status recorded for task {}.", self.task_id);
                Ok(1)
            }
        }
    }
}
