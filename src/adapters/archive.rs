//! Workspace archival
//!
//! [`TarGzArchiver`] writes a gzip-compressed tarball whose entries are
//! rooted at the workspace directory name, so unpacking recreates the
//! workspace directory itself.

use crate::domain::errors::AppExportError;
use crate::domain::Result;
use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Compresses a directory into one archive file
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, src_dir: &Path, dest_file: &Path) -> Result<()>;
}

/// tar + gzip archiver
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzArchiver {
    level: Option<u32>,
}

impl TarGzArchiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an explicit gzip level (0-9)
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Some(level.min(9)),
        }
    }

    fn compression(&self) -> Compression {
        self.level.map(Compression::new).unwrap_or_default()
    }
}

#[async_trait]
impl Archiver for TarGzArchiver {
    async fn archive(&self, src_dir: &Path, dest_file: &Path) -> Result<()> {
        let src: PathBuf = src_dir.to_path_buf();
        let dest: PathBuf = dest_file.to_path_buf();
        let compression = self.compression();

        let written = tokio::task::spawn_blocking(move || write_tar_gz(&src, &dest, compression))
            .await
            .map_err(|e| AppExportError::ArchivalFailed(format!("archive task failed: {e}")))??;

        tracing::info!(
            src = %src_dir.display(),
            dest = %dest_file.display(),
            bytes = written,
            "Workspace archived"
        );
        Ok(())
    }
}

fn write_tar_gz(src: &Path, dest: &Path, compression: Compression) -> Result<u64> {
    if !src.is_dir() {
        return Err(AppExportError::ArchivalFailed(format!(
            "{} is not a directory",
            src.display()
        )));
    }

    let root = src
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| AppExportError::ArchivalFailed(format!("{} has no name", src.display())))?;

    let partial = dest.with_extension("partial");
    let archival = |e: std::io::Error| AppExportError::ArchivalFailed(format!("{}: {e}", dest.display()));

    let file = File::create(&partial).map_err(archival)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, compression));
    builder.follow_symlinks(false);
    builder.append_dir_all(&root, src).map_err(archival)?;
    let encoder = builder.into_inner().map_err(archival)?;
    let file = encoder.finish().map_err(archival)?;
    file.sync_all().map_err(archival)?;
    drop(file);

    std::fs::rename(&partial, dest).map_err(archival)?;
    Ok(std::fs::metadata(dest).map(|m| m.len()).unwrap_or_default())
}
