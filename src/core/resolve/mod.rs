//! Dependency resolution
//!
//! Turns a manifest plus its name registry into fully resolved components:
//! environment, volume binds, config files to materialize and start-after
//! ordering. Resolution never fails; anything that cannot be resolved is
//! skipped and reported as a [`ResolveWarning`].

pub mod env;
pub mod volumes;

use crate::core::naming::ServiceNameRegistry;
use crate::domain::errors::ResolveWarning;
use crate::domain::ids::ShareId;
use crate::domain::manifest::{ApplicationManifest, RegistryCredentials};
use indexmap::{IndexMap, IndexSet};

pub use env::{generate_token, interpolate, memory_label, resolve_environment};
pub use volumes::{plan_volumes, ConfigFileMount, VolumePlan};

/// A component with everything the descriptor needs
#[derive(Debug, Clone)]
pub struct ResolvedComponent {
    pub share_id: ShareId,

    /// Sanitized unique name (service key, container name, directory)
    pub service_name: String,

    pub display_name: String,
    pub image: Option<String>,
    pub credentials: Option<RegistryCredentials>,
    pub command: Option<String>,
    pub environment: IndexMap<String, String>,

    /// Bind strings, own volumes first
    pub volumes: Vec<String>,

    pub config_files: Vec<ConfigFileMount>,

    /// Service names this one starts after
    pub depends_on: Vec<String>,
}

/// Resolution output for one export
#[derive(Debug, Clone, Default)]
pub struct ResolvedApplication {
    pub app_name: String,

    /// Components in manifest order
    pub components: IndexMap<ShareId, ResolvedComponent>,

    /// Global named volumes, first-seen order
    pub named_volumes: IndexSet<String>,

    pub warnings: Vec<ResolveWarning>,
}

impl ResolvedApplication {
    pub fn component(&self, share_id: &ShareId) -> Option<&ResolvedComponent> {
        self.components.get(share_id)
    }

    /// Resolved component by service name
    pub fn service(&self, service_name: &str) -> Option<&ResolvedComponent> {
        self.components
            .values()
            .find(|c| c.service_name == service_name)
    }
}

/// Resolves every component in manifest order
pub fn resolve(manifest: &ApplicationManifest, registry: &ServiceNameRegistry) -> ResolvedApplication {
    let pattern = env::reference_pattern();
    let mut plan = plan_volumes(manifest, registry);
    let mut warnings = Vec::new();
    let mut components = IndexMap::with_capacity(manifest.components.len());

    for component in &manifest.components {
        let Some(service_name) = registry.name(&component.share_id) else {
            continue;
        };
        if components.contains_key(&component.share_id) {
            continue;
        }

        let mut depends_on: Vec<String> = Vec::new();
        for edge in &component.dependencies {
            match registry.name(&edge.target) {
                Some(target) if edge.target == component.share_id => {
                    tracing::debug!(service = %target, "Ignoring self dependency");
                }
                Some(target) => {
                    if !depends_on.iter().any(|d| d == target) {
                        depends_on.push(target.to_string());
                    }
                }
                None => {
                    let warning = ResolveWarning::DependencyMissing {
                        component: component.display_name.clone(),
                        target: edge.target.to_string(),
                    };
                    tracing::warn!(
                        component = %component.display_name,
                        target = %edge.target,
                        "{warning}"
                    );
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                }
            }
        }

        let resolved = ResolvedComponent {
            share_id: component.share_id.clone(),
            service_name: service_name.to_string(),
            display_name: component.display_name.clone(),
            image: component.image.clone(),
            credentials: component.credentials.clone(),
            command: component.command.clone(),
            environment: resolve_environment(component, manifest, &pattern),
            volumes: plan.binds_for(&component.share_id).to_vec(),
            config_files: plan.config_files_for(&component.share_id).to_vec(),
            depends_on,
        };
        components.insert(component.share_id.clone(), resolved);
    }

    warnings.append(&mut plan.warnings);

    tracing::debug!(
        app = %manifest.app_name,
        components = components.len(),
        named_volumes = plan.named_volumes.len(),
        warnings = warnings.len(),
        "Resolved application"
    );

    ResolvedApplication {
        app_name: manifest.app_name.clone(),
        components,
        named_volumes: plan.named_volumes,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::manifest::{Component, DependencyEdge, EnvVar, VolumeKind, VolumeMount};

    fn component(name: &str, id: &str) -> Component {
        Component {
            display_name: name.into(),
            share_id: ShareId::new(id),
            image: Some(format!("goodrain.me/{id}:1.0")),
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_dependency_volume_and_env() {
        let mut a = component("A", "a");
        a.volumes = vec![VolumeMount {
            name: "data".into(),
            mount_path: "/var/lib/data".into(),
            kind: VolumeKind::Regular,
            file_content: None,
        }];
        a.public_env = vec![EnvVar::new("A_HOST", "127.0.0.1")];

        let mut b = component("B", "b");
        b.dependencies = vec![
            DependencyEdge::new("a"),
            DependencyEdge::new("a").with_volume("data", "/mnt/a-data"),
        ];

        let manifest = ApplicationManifest {
            app_name: "demo".into(),
            components: vec![a, b],
            plugins: vec![],
        };
        let registry = ServiceNameRegistry::build(&manifest.components);
        let resolved = resolve(&manifest, &registry);

        let b = resolved.component(&ShareId::new("b")).unwrap();
        assert_eq!(b.volumes, vec!["A_data:/mnt/a-data".to_string()]);
        assert_eq!(b.depends_on, vec!["A".to_string()]);
        assert_eq!(b.environment["A_HOST"], "127.0.0.1");
        assert!(resolved.warnings.is_empty());
        assert!(resolved.named_volumes.contains("A_data"));
    }

    #[test]
    fn test_missing_dependency_is_warning() {
        let mut b = component("B", "b");
        b.dependencies = vec![DependencyEdge::new("ghost"), DependencyEdge::new("ghost")];
        let manifest = ApplicationManifest {
            app_name: "demo".into(),
            components: vec![b],
            plugins: vec![],
        };
        let registry = ServiceNameRegistry::build(&manifest.components);
        let resolved = resolve(&manifest, &registry);

        assert!(resolved.components[0].depends_on.is_empty());
        assert_eq!(
            resolved.warnings,
            vec![ResolveWarning::DependencyMissing {
                component: "B".into(),
                target: "ghost".into()
            }]
        );
    }

    #[test]
    fn test_self_dependency_ignored() {
        let mut a = component("A", "a");
        a.dependencies = vec![DependencyEdge::new("a")];
        let manifest = ApplicationManifest {
            app_name: "demo".into(),
            components: vec![a],
            plugins: vec![],
        };
        let registry = ServiceNameRegistry::build(&manifest.components);
        let resolved = resolve(&manifest, &registry);
        assert!(resolved.components[0].depends_on.is_empty());
        assert!(resolved.service("A").is_some());
    }
}
