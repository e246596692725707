//! Application manifest model
//!
//! The in-memory form of `metadata.json` that the rest of the engine works
//! with, independent of which of the two historical document shapes it was
//! read from. Everything here is immutable for the duration of one export.

use crate::config::SecretString;
use crate::domain::ids::ShareId;

/// Environment value that asks for a freshly generated secret
pub const GENERATED_VALUE_PLACEHOLDER: &str = "**None**";

/// Root manifest document
#[derive(Debug, Clone, Default)]
pub struct ApplicationManifest {
    /// Application (group) name
    pub app_name: String,

    /// Components in manifest order
    pub components: Vec<Component>,

    /// Plugin images shipped alongside the components
    pub plugins: Vec<PluginImage>,
}

impl ApplicationManifest {
    /// Look up a component by its share identifier
    pub fn component(&self, share_id: &ShareId) -> Option<&Component> {
        self.components.iter().find(|c| &c.share_id == share_id)
    }
}

/// One deployable unit
#[derive(Debug, Clone, Default)]
pub struct Component {
    /// Human-readable name, possibly containing `\uXXXX` escapes
    pub display_name: String,

    /// Stable cross-component reference key
    pub share_id: ShareId,

    /// Source image reference, `None` when the component ships no image
    pub image: Option<String>,

    /// Registry credentials for pulling `image`
    pub credentials: Option<RegistryCredentials>,

    /// Memory allocation in MB
    pub memory: i64,

    /// Declared container ports, in declaration order
    pub ports: Vec<i64>,

    /// Startup command, copied verbatim into the descriptor
    pub command: Option<String>,

    /// Volumes owned by this component
    pub volumes: Vec<VolumeMount>,

    /// Edges to the components this one depends on
    pub dependencies: Vec<DependencyEdge>,

    /// Private environment entries
    pub private_env: Vec<EnvVar>,

    /// Public environment entries, also exported to dependents
    pub public_env: Vec<EnvVar>,

    /// Build artifact shipped instead of an image (legacy records only)
    pub slug: Option<SlugArtifact>,
}

/// A single environment entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Volume type tag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VolumeKind {
    /// Named volume shared through the container runtime
    #[default]
    Regular,
    /// File materialized from literal content in the manifest
    ConfigFile,
}

impl VolumeKind {
    /// Maps the manifest's `volume_type` tag; every tag other than
    /// `config-file` is a regular volume.
    pub fn from_tag(tag: &str) -> Self {
        if tag == "config-file" {
            VolumeKind::ConfigFile
        } else {
            VolumeKind::Regular
        }
    }
}

/// A volume mounted into a component's container
#[derive(Debug, Clone, Default)]
pub struct VolumeMount {
    /// Logical volume name
    pub name: String,

    /// Absolute mount path inside the container
    pub mount_path: String,

    /// Volume type
    pub kind: VolumeKind,

    /// Literal file content (config-file volumes only)
    pub file_content: Option<String>,
}

impl VolumeMount {
    pub fn is_config_file(&self) -> bool {
        self.kind == VolumeKind::ConfigFile
    }
}

/// Directed relation from a dependent component to the one it depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Share identifier of the depended-on component
    pub target: ShareId,

    /// Optional request to mount one of the target's volumes
    pub volume: Option<VolumeBinding>,
}

impl DependencyEdge {
    pub fn new(target: impl Into<ShareId>) -> Self {
        Self {
            target: target.into(),
            volume: None,
        }
    }

    pub fn with_volume(mut self, volume_name: &str, mount_path: &str) -> Self {
        self.volume = Some(VolumeBinding {
            volume_name: volume_name.to_string(),
            mount_path: mount_path.to_string(),
        });
        self
    }
}

/// Source volume and target mount path of a dependency volume binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub volume_name: String,
    pub mount_path: String,
}

/// Credentials for a private registry
#[derive(Debug, Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: SecretString,
}

impl RegistryCredentials {
    /// Builds credentials from manifest fields; blank usernames mean
    /// anonymous pulls.
    pub fn from_parts(username: &str, password: &str) -> Option<Self> {
        if username.trim().is_empty() {
            return None;
        }
        Some(Self {
            username: username.to_string(),
            password: crate::config::secret_string(password.to_string()),
        })
    }
}

/// Plugin image declared by a platform-native manifest
#[derive(Debug, Clone)]
pub struct PluginImage {
    /// Display name, possibly escaped
    pub name: String,

    /// Image reference
    pub image: String,

    /// Registry credentials
    pub credentials: Option<RegistryCredentials>,
}

/// Host serving legacy build artifacts
#[derive(Debug, Clone)]
pub struct RemoteEndpoint {
    pub host: String,
    pub port: String,
    pub username: String,
    pub password: SecretString,
}

/// Legacy build artifact ("slug") of an image-less app
#[derive(Debug, Clone)]
pub struct SlugArtifact {
    /// Artifact path, both locally and on the remote host
    pub path: String,

    /// Where to download the artifact when no local copy exists
    pub endpoint: RemoteEndpoint,
}
