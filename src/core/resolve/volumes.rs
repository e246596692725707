//! Volume bind resolution
//!
//! Own volumes are resolved for every component first; dependency bindings
//! are resolved in a second pass against the complete table, so edge order
//! across components does not matter.

use crate::core::naming::ServiceNameRegistry;
use crate::domain::errors::ResolveWarning;
use crate::domain::ids::ShareId;
use crate::domain::manifest::{ApplicationManifest, VolumeMount};
use indexmap::{IndexMap, IndexSet};

/// A config-file volume to materialize under the component's directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileMount {
    /// Path relative to the workspace, e.g. `web/etc/app.conf`
    pub relative_path: String,

    /// Mount path inside the container
    pub mount_path: String,

    /// File content
    pub content: String,
}

/// Volume binds for every component plus the global named volumes
#[derive(Debug, Clone, Default)]
pub struct VolumePlan {
    pub binds: IndexMap<ShareId, Vec<String>>,
    pub named_volumes: IndexSet<String>,
    pub config_files: IndexMap<ShareId, Vec<ConfigFileMount>>,
    pub warnings: Vec<ResolveWarning>,
}

impl VolumePlan {
    pub fn binds_for(&self, share_id: &ShareId) -> &[String] {
        self.binds.get(share_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn config_files_for(&self, share_id: &ShareId) -> &[ConfigFileMount] {
        self.config_files
            .get(share_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Lexically joins `relative` onto `base`, dropping empty and `.` segments
///
/// `..` in `relative` only unwinds segments of `relative` itself, so the
/// result always stays under `base`.
pub fn clean_join(base: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = base
        .split('/')
        .filter(|s| !matches!(*s, "" | "." | ".."))
        .collect();
    let floor = parts.len();

    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.len() > floor {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Bind source of a config-file volume: `./<service>/<mount path>`
pub fn config_file_source(service_name: &str, mount_path: &str) -> String {
    format!("./{}", clean_join(service_name, mount_path))
}

/// Named volume of a regular volume: `<service>_<volume>`
pub fn named_volume(service_name: &str, volume_name: &str) -> String {
    format!("{service_name}_{volume_name}")
}

pub fn plan_volumes(manifest: &ApplicationManifest, registry: &ServiceNameRegistry) -> VolumePlan {
    let mut plan = VolumePlan::default();
    // (owner, volume name) -> bind source
    let mut sources: IndexMap<(ShareId, String), String> = IndexMap::new();

    for component in &manifest.components {
        let Some(service_name) = registry.name(&component.share_id) else {
            continue;
        };
        if plan.binds.contains_key(&component.share_id) {
            continue;
        }

        let mut binds = Vec::with_capacity(component.volumes.len());
        let mut config_files = Vec::new();

        for volume in &component.volumes {
            let source = own_volume_source(service_name, volume);
            binds.push(format!("{}:{}", source, volume.mount_path));

            if volume.is_config_file() {
                config_files.push(ConfigFileMount {
                    relative_path: clean_join(service_name, &volume.mount_path),
                    mount_path: volume.mount_path.clone(),
                    content: volume.file_content.clone().unwrap_or_default(),
                });
            } else {
                plan.named_volumes.insert(source.clone());
            }
            sources.insert((component.share_id.clone(), volume.name.clone()), source);
        }

        plan.binds.insert(component.share_id.clone(), binds);
        plan.config_files
            .insert(component.share_id.clone(), config_files);
    }

    for component in &manifest.components {
        if !registry.contains(&component.share_id) {
            continue;
        }
        for edge in &component.dependencies {
            let Some(binding) = &edge.volume else {
                continue;
            };

            match sources.get(&(edge.target.clone(), binding.volume_name.clone())) {
                Some(source) => {
                    let bind = format!("{}:{}", source, binding.mount_path);
                    if let Some(binds) = plan.binds.get_mut(&component.share_id) {
                        binds.push(bind);
                    }
                }
                None => {
                    let warning = ResolveWarning::VolumeBindingUnresolved {
                        component: component.display_name.clone(),
                        target: edge.target.to_string(),
                        volume: binding.volume_name.clone(),
                    };
                    tracing::warn!(
                        component = %component.display_name,
                        target = %edge.target,
                        volume = %binding.volume_name,
                        "{warning}"
                    );
                    plan.warnings.push(warning);
                }
            }
        }
    }

    plan
}

fn own_volume_source(service_name: &str, volume: &VolumeMount) -> String {
    if volume.is_config_file() {
        config_file_source(service_name, &volume.mount_path)
    } else {
        named_volume(service_name, &volume.name)
    }
}
