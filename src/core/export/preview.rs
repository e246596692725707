//! Descriptor preview
//!
//! Resolves a structured manifest and renders the compose descriptor without
//! touching images or the workspace.

use crate::adapters::image::ImageReference;
use crate::core::compose;
use crate::core::manifest::read_structured_manifest;
use crate::core::naming::ServiceNameRegistry;
use crate::core::resolve::resolve;
use crate::domain::errors::ResolveWarning;
use crate::domain::Result;
use std::path::Path;

/// Rendered descriptor plus the resolver warnings behind it
#[derive(Debug, Clone)]
pub struct DescriptorPreview {
    pub yaml: String,
    pub warnings: Vec<ResolveWarning>,
}

/// Renders the descriptor for the manifest in `workspace`
///
/// Image names are flattened onto `registry_domain` the same way a real
/// export would tag them.
pub fn preview_descriptor(workspace: &Path, registry_domain: &str) -> Result<DescriptorPreview> {
    let manifest = read_structured_manifest(workspace)?;
    let registry = ServiceNameRegistry::build(&manifest.components);
    let resolved = resolve(&manifest, &registry);

    let descriptor = compose::build(&resolved, |image| {
        ImageReference::parse(image).flattened(registry_domain)
    });

    Ok(DescriptorPreview {
        yaml: descriptor.to_yaml()?,
        warnings: resolved.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::compose::ComposeDescriptor;
    use tempfile::TempDir;

    #[test]
    fn test_preview_does_not_touch_workspace() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("metadata.json"),
            r#"{"group_name": "shop", "apps": [
                {"service_cname": "web", "service_share_uuid": "w",
                 "share_image": "hub.example.com/shop/web:1.2",
                 "dep_service_map_list": [{"dep_service_key": "ghost"}]}
            ]}"#,
        )
        .unwrap();

        let preview = preview_descriptor(dir.path(), "goodrain.me").unwrap();
        let descriptor = ComposeDescriptor::from_yaml(&preview.yaml).unwrap();
        assert_eq!(
            descriptor.services["web"].image.as_deref(),
            Some("goodrain.me/web:1.2")
        );
        assert_eq!(preview.warnings.len(), 1);

        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
