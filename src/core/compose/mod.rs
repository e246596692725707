//! Compose descriptor builder
//!
//! Turns a [`ResolvedApplication`] into a [`ComposeDescriptor`]. The builder
//! is pure: image flattening is an injected naming function so the same
//! resolved input always yields the same document.

pub mod descriptor;

use crate::core::resolve::ResolvedApplication;

pub use descriptor::{
    ComposeDescriptor, ComposeService, GlobalVolume, LoggingOptions, LoggingPolicy,
    DESCRIPTOR_FILE,
};

/// Builds the descriptor; `flatten` maps a source image to its transfer-safe
/// name
pub fn build<F>(resolved: &ResolvedApplication, flatten: F) -> ComposeDescriptor
where
    F: Fn(&str) -> String,
{
    let mut descriptor = ComposeDescriptor::default();

    for volume in &resolved.named_volumes {
        descriptor
            .volumes
            .insert(volume.clone(), GlobalVolume { external: false });
    }

    for component in resolved.components.values() {
        let service = ComposeService {
            image: component.image.as_deref().map(&flatten),
            container_name: component.service_name.clone(),
            restart: descriptor::RESTART_POLICY.to_string(),
            network_mode: descriptor::NETWORK_MODE.to_string(),
            volumes: component.volumes.clone(),
            command: component.command.clone().filter(|c| !c.trim().is_empty()),
            environment: component.environment.clone(),
            depends_on: component.depends_on.clone(),
            logging: LoggingPolicy::default(),
        };
        descriptor
            .services
            .insert(component.service_name.clone(), service);
    }

    tracing::debug!(
        services = descriptor.services.len(),
        volumes = descriptor.volumes.len(),
        "Built compose descriptor"
    );

    descriptor
}
