//! Freshness gate
//!
//! An export is fresh when the manifest checksum sidecar verifies and the
//! archive produced by the last successful run is still on disk. Only the
//! sidecar is consulted: a manifest edited without regenerating the sidecar
//! is indistinguishable from an unchanged one.

use super::checksum::verify_sidecar;
use std::path::Path;

/// Outcome of the freshness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Sidecar verifies and the archive exists; nothing to do
    Fresh,
    /// Sidecar missing, malformed or not matching
    ChecksumStale,
    /// Sidecar verifies but the archive is gone
    ArchiveMissing,
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Runs the freshness check without touching the filesystem
pub fn check_freshness(checksum_path: &Path, archive_path: &Path) -> Freshness {
    if !verify_sidecar(checksum_path) {
        return Freshness::ChecksumStale;
    }
    if !archive_path.is_file() {
        return Freshness::ArchiveMissing;
    }
    Freshness::Fresh
}
