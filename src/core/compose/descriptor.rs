//! Compose descriptor document model
//!
//! Field order here is the order keys appear in `docker-compose.yaml`.

use crate::domain::result::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Descriptor file name inside the workspace
pub const DESCRIPTOR_FILE: &str = "docker-compose.yaml";

pub const COMPOSE_VERSION: &str = "2.1";
pub const RESTART_POLICY: &str = "always";
pub const NETWORK_MODE: &str = "host";
pub const LOG_DRIVER: &str = "json-file";
pub const LOG_MAX_SIZE: &str = "5m";
pub const LOG_MAX_FILE: &str = "2";

/// Root `docker-compose.yaml` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeDescriptor {
    pub version: String,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub volumes: IndexMap<String, GlobalVolume>,

    #[serde(default)]
    pub services: IndexMap<String, ComposeService>,
}

impl Default for ComposeDescriptor {
    fn default() -> Self {
        Self {
            version: COMPOSE_VERSION.to_string(),
            volumes: IndexMap::new(),
            services: IndexMap::new(),
        }
    }
}

impl ComposeDescriptor {
    /// Serializes to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parses a descriptor back, mainly for inspection and tests
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Global named volume entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalVolume {
    pub external: bool,
}

/// One service definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeService {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    pub container_name: String,
    pub restart: String,
    pub network_mode: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    pub logging: LoggingPolicy,
}

/// Container log driver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingPolicy {
    pub driver: String,
    pub options: LoggingOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingOptions {
    #[serde(rename = "max-size")]
    pub max_size: String,

    #[serde(rename = "max-file")]
    pub max_file: String,
}

impl Default for LoggingPolicy {
    fn default() -> Self {
        Self {
            driver: LOG_DRIVER.to_string(),
            options: LoggingOptions {
                max_size: LOG_MAX_SIZE.to_string(),
                max_file: LOG_MAX_FILE.to_string(),
            },
        }
    }
}
