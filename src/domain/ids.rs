//! Domain identifier types with validation
//!
//! Newtype wrappers keep task identifiers and component share identifiers
//! from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Export task identifier
///
/// Assigned by the dispatcher (the "event id" of the export request). It keys
/// the status record and the per-task event log.
///
/// # Examples
///
/// ```
/// use appexport::domain::ids::TaskId;
/// use std::str::FromStr;
///
/// let id = TaskId::from_str("5f0c3b1e9a7d4c2e").unwrap();
/// assert_eq!(id.as_str(), "5f0c3b1e9a7d4c2e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new TaskId, rejecting blank identifiers
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Task ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Generates a fresh random task identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the task ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for TaskId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Component share identifier
///
/// The stable key components use to reference each other in dependency
/// edges and volume relations. Blank values are tolerated because legacy
/// manifests sometimes omit them; such components simply cannot be
/// depended upon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareId(String);

impl ShareId {
    /// Wraps a share identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the share ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the manifest left this identifier blank
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ShareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShareId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ShareId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for ShareId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
