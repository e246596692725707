//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{AppExportConfig, PostgreSQLConfig, StatusTarget};
use super::secret::secret_string;
use crate::domain::errors::AppExportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into AppExportConfig
/// 4. Applies environment variable overrides (APPEXPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced variable is not
/// set, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use appexport::config::loader::load_config;
///
/// let config = load_config("appexport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<AppExportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(AppExportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        AppExportError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_str(&contents)
}

/// Loads configuration from TOML text, applying the same substitution,
/// overrides and validation as [`load_config`]
pub fn load_config_str(contents: &str) -> Result<AppExportConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: AppExportConfig = toml::from_str(&contents)
        .map_err(|e| AppExportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        AppExportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| AppExportError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(AppExportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AppExportError::Configuration(format!("Invalid value for {key}: '{raw}'"))
        }),
    }
}

/// Applies environment variable overrides using the APPEXPORT_* prefix
///
/// Environment variables follow the pattern APPEXPORT_<SECTION>_<KEY>, for
/// example APPEXPORT_EXPORT_REGISTRY_DOMAIN or APPEXPORT_STATUS_TARGET.
fn apply_env_overrides(config: &mut AppExportConfig) -> Result<()> {
    // Application overrides
    if let Some(val) = env("APPEXPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Export overrides
    if let Some(val) = env("APPEXPORT_EXPORT_REGISTRY_DOMAIN") {
        config.export.registry_domain = val;
    }
    if let Some(val) = env("APPEXPORT_EXPORT_RUNNER_IMAGE_MARKER") {
        config.export.runner_image_marker = val;
    }
    if let Some(val) = parse_env("APPEXPORT_EXPORT_PULL_ATTEMPTS")? {
        config.export.pull_attempts = val;
    }
    if let Some(val) = parse_env("APPEXPORT_EXPORT_TAG_ATTEMPTS")? {
        config.export.tag_attempts = val;
    }
    if let Some(val) = env("APPEXPORT_EXPORT_STARTUP_SCRIPT") {
        config.export.startup_script = Some(PathBuf::from(val));
    }
    if let Some(val) = env("APPEXPORT_EXPORT_ARCHIVE_EXTENSION") {
        config.export.archive_extension = val;
    }
    if let Some(val) = env("APPEXPORT_EXPORT_DEFAULT_REGISTRY_USER") {
        config.export.default_registry_user = Some(val);
    }
    if let Some(val) = env("APPEXPORT_EXPORT_DEFAULT_REGISTRY_PASSWORD") {
        config.export.default_registry_password = Some(secret_string(val));
    }

    // Docker overrides
    if let Some(val) = env("APPEXPORT_DOCKER_BINARY") {
        config.docker.binary = val;
    }
    if let Some(val) = parse_env("APPEXPORT_DOCKER_COMMAND_TIMEOUT_SECS")? {
        config.docker.command_timeout_secs = val;
    }

    // Status overrides
    if let Some(val) = env("APPEXPORT_STATUS_TARGET") {
        config.status.target = match val.to_lowercase().as_str() {
            "file" => StatusTarget::File,
            "postgresql" => StatusTarget::PostgreSQL,
            other => {
                return Err(AppExportError::Configuration(format!(
                    "Invalid APPEXPORT_STATUS_TARGET '{other}'. Must be one of: file, postgresql"
                )))
            }
        };
    }
    if let Some(val) = env("APPEXPORT_STATUS_PATH") {
        config.status.path = PathBuf::from(val);
    }

    // PostgreSQL overrides; a connection string alone is enough to create
    // the section
    if let Some(val) = env("APPEXPORT_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql {
            Some(ref mut pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql = Some(PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 10,
                    connection_timeout_seconds: 30,
                    table: "app_status".to_string(),
                })
            }
        }
    }
    if let Some(ref mut pg) = config.postgresql {
        if let Some(val) = parse_env("APPEXPORT_POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = val;
        }
        if let Some(val) = env("APPEXPORT_POSTGRESQL_TABLE") {
            pg.table = val;
        }
    }

    // Artifact overrides
    if let Some(val) = env("APPEXPORT_ARTIFACTS_SCHEME") {
        config.artifacts.scheme = val;
    }
    if let Some(val) = parse_env("APPEXPORT_ARTIFACTS_TIMEOUT_SECONDS")? {
        config.artifacts.timeout_seconds = val;
    }

    // Event overrides
    if let Some(val) = parse_env("APPEXPORT_EVENTS_ENABLED")? {
        config.events.enabled = val;
    }
    if let Some(val) = env("APPEXPORT_EVENTS_DIRECTORY") {
        config.events.directory = PathBuf::from(val);
    }

    // Logging overrides
    if let Some(val) = parse_env("APPEXPORT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = val;
    }
    if let Some(val) = env("APPEXPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Some(val) = env("APPEXPORT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("APPEXPORT_LOADER_TEST_VAR", "test_value");
        let input = "password = \"${APPEXPORT_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("APPEXPORT_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("APPEXPORT_LOADER_MISSING_VAR");
        let input = "password = \"${APPEXPORT_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("APPEXPORT_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_env_vars_skips_comments() {
        std::env::remove_var("APPEXPORT_LOADER_COMMENTED");
        let input = "# password = \"${APPEXPORT_LOADER_COMMENTED}\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${APPEXPORT_LOADER_COMMENTED}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-appexport.toml");
        assert!(matches!(result, Err(AppExportError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[export]
registry_domain = "registry.example.com"
pull_attempts = 3

[docker]
command_timeout_secs = 120

[status]
target = "file"
path = "/tmp/appexport-status.json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.export.registry_domain, "registry.example.com");
        assert_eq!(config.export.pull_attempts, 3);
        assert_eq!(config.docker.command_timeout_secs, 120);
    }

    #[test]
    fn test_load_config_invalid_values_rejected() {
        let result = load_config_str("[export]\npull_attempts = 0\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("pull_attempts"));
    }
}
