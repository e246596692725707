//! Workspace filesystem helpers

use crate::domain::errors::AppExportError;
use crate::domain::task::MANIFEST_FILE;
use crate::domain::Result;
use std::io::ErrorKind;
use std::path::Path;

/// Empties `workspace` and leaves only the manifest in it
///
/// `manifest` is the content read before the reset; the directory is
/// removed, recreated, and the manifest written back.
pub async fn reset_workspace(workspace: &Path, manifest: &[u8]) -> Result<()> {
    match tokio::fs::remove_dir_all(workspace).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(AppExportError::Workspace(format!(
                "remove {}: {e}",
                workspace.display()
            )))
        }
    }

    create_dir(workspace).await?;
    write_file(&workspace.join(MANIFEST_FILE), manifest).await?;

    tracing::debug!(workspace = %workspace.display(), "Workspace reset");
    Ok(())
}

pub async fn create_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| AppExportError::Workspace(format!("create {}: {e}", path.display())))
}

/// Writes `content` to `path`, creating parent directories
pub async fn write_file(path: &Path, content: impl AsRef<[u8]>) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir(parent).await?;
    }
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppExportError::Workspace(format!("write {}: {e}", path.display())))
}

/// Marks `path` executable (0755)
#[cfg(unix)]
pub async fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| AppExportError::Workspace(format!("chmod {}: {e}", path.display())))
}

#[cfg(not(unix))]
pub async fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
