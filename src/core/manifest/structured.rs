//! Strongly-typed manifest shape (compose path)

use super::lenient;
use super::ManifestSource;
use crate::domain::ids::ShareId;
use crate::domain::manifest::{
    Component, DependencyEdge, EnvVar, PluginImage, RegistryCredentials, VolumeKind, VolumeMount,
};
use serde::Deserialize;

/// Root of the structured document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredDocument {
    #[serde(default, alias = "app_name", deserialize_with = "lenient::string")]
    pub group_name: String,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub apps: Vec<StructuredComponent>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub plugins: Vec<StructuredPlugin>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredComponent {
    #[serde(default, deserialize_with = "lenient::string")]
    pub service_cname: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub service_share_uuid: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub share_image: String,

    #[serde(default)]
    pub service_image: Option<ImageAuth>,

    #[serde(default, deserialize_with = "lenient::int")]
    pub memory: i64,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub port_map_list: Vec<PortEntry>,

    #[serde(default, deserialize_with = "lenient::string")]
    pub cmd: String,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub service_env_map_list: Vec<EnvEntry>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub service_connect_info_map_list: Vec<EnvEntry>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub service_volume_map_list: Vec<VolumeEntry>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub dep_service_map_list: Vec<DependencyEntry>,

    #[serde(default, deserialize_with = "lenient::seq")]
    pub mnt_relation_list: Vec<MountRelationEntry>,
}

/// Registry credentials block (`service_image` / `plugin_image`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageAuth {
    #[serde(default, deserialize_with = "lenient::string")]
    pub hub_user: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub hub_password: String,
}

impl ImageAuth {
    fn credentials(&self) -> Option<RegistryCredentials> {
        RegistryCredentials::from_parts(&self.hub_user, &self.hub_password)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PortEntry {
    #[serde(default, deserialize_with = "lenient::int")]
    pub container_port: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub attr_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub attr_value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub volume_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub volume_path: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub volume_type: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub file_content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DependencyEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub dep_service_key: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MountRelationEntry {
    #[serde(default, deserialize_with = "lenient::string")]
    pub service_share_uuid: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub mnt_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub mnt_dir: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StructuredPlugin {
    #[serde(default, deserialize_with = "lenient::string")]
    pub plugin_name: String,

    #[serde(default, deserialize_with = "lenient::string")]
    pub share_image: String,

    #[serde(default)]
    pub plugin_image: Option<ImageAuth>,
}

impl VolumeEntry {
    pub(crate) fn to_mount(&self) -> VolumeMount {
        let kind = VolumeKind::from_tag(&self.volume_type);
        VolumeMount {
            name: self.volume_name.clone(),
            mount_path: self.volume_path.clone(),
            kind,
            file_content: (kind == VolumeKind::ConfigFile).then(|| self.file_content.clone()),
        }
    }
}

fn env_vars(entries: &[EnvEntry]) -> Vec<EnvVar> {
    entries
        .iter()
        .filter(|e| !e.attr_name.is_empty())
        .map(|e| EnvVar::new(&e.attr_name, &e.attr_value))
        .collect()
}

impl StructuredComponent {
    /// Plain dependencies first, then volume relations, each in declaration
    /// order
    fn dependency_edges(&self) -> Vec<DependencyEdge> {
        let plain = self
            .dep_service_map_list
            .iter()
            .filter(|d| !d.dep_service_key.is_empty())
            .map(|d| DependencyEdge::new(d.dep_service_key.as_str()));

        let mounts = self
            .mnt_relation_list
            .iter()
            .filter(|m| !m.service_share_uuid.is_empty())
            .map(|m| {
                DependencyEdge::new(m.service_share_uuid.as_str())
                    .with_volume(&m.mnt_name, &m.mnt_dir)
            });

        plain.chain(mounts).collect()
    }

    pub fn to_component(&self) -> Component {
        Component {
            display_name: self.service_cname.clone(),
            share_id: ShareId::new(self.service_share_uuid.as_str()),
            image: Some(self.share_image.clone()).filter(|i| !i.trim().is_empty()),
            credentials: self.service_image.as_ref().and_then(ImageAuth::credentials),
            memory: self.memory,
            ports: self.port_map_list.iter().map(|p| p.container_port).collect(),
            command: Some(self.cmd.clone()).filter(|c| !c.is_empty()),
            volumes: self
                .service_volume_map_list
                .iter()
                .map(VolumeEntry::to_mount)
                .collect(),
            dependencies: self.dependency_edges(),
            private_env: env_vars(&self.service_env_map_list),
            public_env: env_vars(&self.service_connect_info_map_list),
            slug: None,
        }
    }
}

impl StructuredPlugin {
    fn to_plugin(&self) -> Option<PluginImage> {
        if self.share_image.trim().is_empty() {
            return None;
        }
        Some(PluginImage {
            name: self.plugin_name.clone(),
            image: self.share_image.clone(),
            credentials: self.plugin_image.as_ref().and_then(ImageAuth::credentials),
        })
    }
}

impl ManifestSource for StructuredDocument {
    fn app_name(&self) -> String {
        self.group_name.clone()
    }

    fn components(&self) -> Vec<Component> {
        self.apps.iter().map(StructuredComponent::to_component).collect()
    }

    fn plugins(&self) -> Vec<PluginImage> {
        self.plugins
            .iter()
            .filter_map(StructuredPlugin::to_plugin)
            .collect()
    }
}
