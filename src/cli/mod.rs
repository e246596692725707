//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for appexport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// appexport - application packaging and export engine
#[derive(Parser, Debug)]
#[command(name = "appexport")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "appexport.toml", env = "APPEXPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "APPEXPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Package an application workspace into an archive
    Export(commands::export::ExportArgs),

    /// Print the compose descriptor a workspace would produce
    Preview(commands::preview::PreviewArgs),

    /// Show the recorded status of an export task
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_export() {
        let cli = Cli::parse_from([
            "appexport",
            "export",
            "--task-id",
            "t-1",
            "--format",
            "docker-compose",
            "--source-dir",
            "/grdata/app/shop",
        ]);
        assert_eq!(cli.config, "appexport.toml");
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.task_id.as_deref(), Some("t-1"));
                assert_eq!(args.format.as_deref(), Some("docker-compose"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_export_batch() {
        let cli = Cli::parse_from(["appexport", "export", "--tasks", "tasks.json"]);
        match cli.command {
            Commands::Export(args) => {
                assert!(args.task_id.is_none());
                assert_eq!(args.tasks.as_deref(), Some(std::path::Path::new("tasks.json")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_export_single_and_batch_conflict() {
        let result = Cli::try_parse_from([
            "appexport",
            "export",
            "--tasks",
            "tasks.json",
            "--task-id",
            "t-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["appexport", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["appexport", "--log-level", "debug", "validate-config"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_preview() {
        let cli = Cli::parse_from(["appexport", "preview", "--source-dir", "/tmp/app"]);
        assert!(matches!(cli.command, Commands::Preview(_)));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["appexport", "status", "--task-id", "t-1"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["appexport", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
