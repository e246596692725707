//! Manifest file loading
//!
//! Both readers load `metadata.json` from the export workspace. Missing or
//! unreadable files are `ManifestUnavailable`; content of the wrong shape is
//! `ManifestMalformed`.

use super::legacy::{AppRecord, LegacyDocument};
use super::structured::StructuredDocument;
use super::ManifestSource;
use crate::domain::errors::AppExportError;
use crate::domain::manifest::ApplicationManifest;
use crate::domain::result::Result;
use crate::domain::task::MANIFEST_FILE;
use serde_json::Value;
use std::path::Path;

/// Raw manifest bytes
pub fn read_manifest_bytes(workspace: &Path) -> Result<Vec<u8>> {
    let path = workspace.join(MANIFEST_FILE);
    std::fs::read(&path).map_err(|e| AppExportError::ManifestUnavailable {
        path: path.clone(),
        reason: e.to_string(),
    })
}

/// Reads the legacy document; zero app records is an error
pub fn read_legacy_document(workspace: &Path) -> Result<LegacyDocument> {
    parse_legacy_document(&read_manifest_bytes(workspace)?)
}

/// Parses legacy manifest bytes already read from disk
pub fn parse_legacy_document(data: &[u8]) -> Result<LegacyDocument> {
    let root: Value = serde_json::from_slice(data)
        .map_err(|e| AppExportError::ManifestMalformed(format!("invalid JSON: {e}")))?;

    let document = LegacyDocument::from_value(&root);
    if document.apps.is_empty() {
        return Err(AppExportError::ManifestMalformed(
            "no app records found in manifest".to_string(),
        ));
    }

    tracing::debug!(count = document.apps.len(), "Parsed legacy app records");
    Ok(document)
}

/// Parses legacy manifest bytes into the common manifest model
pub fn parse_legacy_manifest(data: &[u8]) -> Result<ApplicationManifest> {
    parse_legacy_document(data).map(|document| document.to_manifest())
}

/// Legacy app records in manifest order
pub fn read_legacy_apps(workspace: &Path) -> Result<Vec<AppRecord>> {
    read_legacy_document(workspace).map(|doc| doc.apps)
}

/// Reads the structured document into the common manifest model
pub fn read_structured_manifest(workspace: &Path) -> Result<ApplicationManifest> {
    parse_structured_manifest(&read_manifest_bytes(workspace)?)
}

pub fn parse_structured_manifest(data: &[u8]) -> Result<ApplicationManifest> {
    let document: StructuredDocument = serde_json::from_slice(data)
        .map_err(|e| AppExportError::ManifestMalformed(format!("unmarshal manifest: {e}")))?;

    let manifest = document.to_manifest();
    tracing::debug!(
        app = %manifest.app_name,
        components = manifest.components.len(),
        "Parsed structured manifest"
    );
    Ok(manifest)
}
