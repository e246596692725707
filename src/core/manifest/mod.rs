//! Manifest reading
//!
//! Two historical document shapes feed one common model. Each shape is an
//! adapter implementing [`ManifestSource`]:
//!
//! - [`legacy::LegacyDocument`] - loosely-typed `apps[]` records
//! - [`structured::StructuredDocument`] - typed component model

pub mod legacy;
pub mod lenient;
pub mod reader;
pub mod structured;

use crate::domain::manifest::{ApplicationManifest, Component, PluginImage};

pub use legacy::{AppRecord, LegacyDocument};
pub use reader::{
    parse_legacy_document, parse_legacy_manifest, parse_structured_manifest, read_legacy_apps,
    read_legacy_document, read_manifest_bytes, read_structured_manifest,
};
pub use structured::StructuredDocument;

/// A manifest shape that can produce the common component model
pub trait ManifestSource {
    fn app_name(&self) -> String;

    /// Components in manifest order
    fn components(&self) -> Vec<Component>;

    fn plugins(&self) -> Vec<PluginImage>;

    fn to_manifest(&self) -> ApplicationManifest {
        ApplicationManifest {
            app_name: self.app_name(),
            components: self.components(),
            plugins: self.plugins(),
        }
    }
}
