//! Loosely-typed manifest shape (platform-native path)
//!
//! Legacy app records are kept as raw JSON and read through dotted-path
//! accessors, so unknown or oddly-typed fields never fail the export.

use super::lenient::{value_to_int, value_to_string};
use super::ManifestSource;
use crate::config::secret_string;
use crate::domain::ids::ShareId;
use crate::domain::manifest::{
    Component, DependencyEdge, EnvVar, PluginImage, RegistryCredentials, RemoteEndpoint,
    SlugArtifact, VolumeKind, VolumeMount,
};
use serde_json::Value;

/// One `apps[]` record
#[derive(Debug, Clone)]
pub struct AppRecord(Value);

impl AppRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Value at a dotted path such as `service_image.hub_user`
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.0, path)
    }

    /// String at a dotted path; absent or non-scalar values read as empty
    pub fn str(&self, path: &str) -> String {
        value_to_string(self.get(path))
    }

    /// Integer at a dotted path; absent or unparsable values read as zero
    pub fn int(&self, path: &str) -> i64 {
        value_to_int(self.get(path))
    }

    /// Array at a dotted path; anything else reads as empty
    pub fn array(&self, path: &str) -> &[Value] {
        match self.get(path) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        }
    }

    pub fn display_name(&self) -> String {
        self.str("service_cname")
    }

    pub fn share_id(&self) -> ShareId {
        ShareId::new(self.str("service_share_uuid"))
    }

    /// Image reference, `None` when blank
    pub fn share_image(&self) -> Option<String> {
        Some(self.str("share_image")).filter(|i| !i.trim().is_empty())
    }

    pub fn credentials(&self) -> Option<RegistryCredentials> {
        RegistryCredentials::from_parts(
            &self.str("service_image.hub_user"),
            &self.str("service_image.hub_password"),
        )
    }

    pub fn volumes(&self) -> Vec<VolumeMount> {
        self.array("service_volume_map_list")
            .iter()
            .map(|v| {
                let kind = VolumeKind::from_tag(&value_to_string(lookup(v, "volume_type")));
                VolumeMount {
                    name: value_to_string(lookup(v, "volume_name")),
                    mount_path: value_to_string(lookup(v, "volume_path")),
                    kind,
                    file_content: (kind == VolumeKind::ConfigFile)
                        .then(|| value_to_string(lookup(v, "file_content"))),
                }
            })
            .collect()
    }

    /// Build artifact, present when `share_slug_path` is set
    pub fn slug(&self) -> Option<SlugArtifact> {
        let path = self.str("share_slug_path");
        if path.trim().is_empty() {
            return None;
        }
        Some(SlugArtifact {
            path,
            endpoint: RemoteEndpoint {
                host: self.str("service_slug.ftp_host"),
                port: self.str("service_slug.ftp_port"),
                username: self.str("service_slug.ftp_username"),
                password: secret_string(self.str("service_slug.ftp_password")),
            },
        })
    }

    fn env(&self, path: &str) -> Vec<EnvVar> {
        self.array(path)
            .iter()
            .map(|item| {
                EnvVar::new(
                    value_to_string(lookup(item, "attr_name")),
                    value_to_string(lookup(item, "attr_value")),
                )
            })
            .filter(|e| !e.name.is_empty())
            .collect()
    }

    fn dependencies(&self) -> Vec<DependencyEdge> {
        let plain = self
            .array("dep_service_map_list")
            .iter()
            .map(|d| value_to_string(lookup(d, "dep_service_key")))
            .filter(|key| !key.is_empty())
            .map(DependencyEdge::new);

        let mounts = self.array("mnt_relation_list").iter().filter_map(|m| {
            let target = value_to_string(lookup(m, "service_share_uuid"));
            (!target.is_empty()).then(|| {
                DependencyEdge::new(target).with_volume(
                    &value_to_string(lookup(m, "mnt_name")),
                    &value_to_string(lookup(m, "mnt_dir")),
                )
            })
        });

        plain.chain(mounts).collect()
    }

    pub fn to_component(&self) -> Component {
        Component {
            display_name: self.display_name(),
            share_id: self.share_id(),
            image: self.share_image(),
            credentials: self.credentials(),
            memory: self.int("memory"),
            ports: self
                .array("port_map_list")
                .iter()
                .map(|p| value_to_int(lookup(p, "container_port")))
                .collect(),
            command: Some(self.str("cmd")).filter(|c| !c.is_empty()),
            volumes: self.volumes(),
            dependencies: self.dependencies(),
            private_env: self.env("service_env_map_list"),
            public_env: self.env("service_connect_info_map_list"),
            slug: self.slug(),
        }
    }
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, key| current.get(key))
}

/// Legacy document: app records plus plugins
#[derive(Debug, Clone, Default)]
pub struct LegacyDocument {
    pub app_name: String,
    pub apps: Vec<AppRecord>,
    pub plugins: Vec<PluginImage>,
}

impl LegacyDocument {
    /// Splits a parsed document into its parts; `apps` and `plugins` that
    /// are not arrays read as empty
    pub fn from_value(root: &Value) -> Self {
        let apps = match root.get("apps") {
            Some(Value::Array(items)) => items.iter().cloned().map(AppRecord::new).collect(),
            _ => Vec::new(),
        };

        let plugins = match root.get("plugins") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|p| {
                    let image = value_to_string(lookup(p, "share_image"));
                    if image.trim().is_empty() {
                        return None;
                    }
                    Some(PluginImage {
                        name: value_to_string(lookup(p, "plugin_name")),
                        image,
                        credentials: RegistryCredentials::from_parts(
                            &value_to_string(lookup(p, "plugin_image.hub_user")),
                            &value_to_string(lookup(p, "plugin_image.hub_password")),
                        ),
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        Self {
            app_name: value_to_string(root.get("group_name")),
            apps,
            plugins,
        }
    }
}

impl ManifestSource for LegacyDocument {
    fn app_name(&self) -> String {
        self.app_name.clone()
    }

    fn components(&self) -> Vec<Component> {
        self.apps.iter().map(AppRecord::to_component).collect()
    }

    fn plugins(&self) -> Vec<PluginImage> {
        self.plugins.clone()
    }
}
