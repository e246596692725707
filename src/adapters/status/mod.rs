//! Export status persistence
//!
//! The engine writes one [`ExportRecord`] per terminal transition. Two
//! backends are available, selected by `[status].target`:
//!
//! - [`FileStatusStore`] - a JSON document on local disk
//! - [`PostgresStatusStore`] - a table in PostgreSQL

pub mod file;
pub mod postgres;

use crate::config::{AppExportConfig, StatusTarget};
use crate::domain::errors::AppExportError;
use crate::domain::task::ExportRecord;
use crate::domain::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use file::FileStatusStore;
pub use postgres::PostgresStatusStore;

/// Persistent task status, keyed by task id
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Record for a task, `None` when the task was never recorded
    async fn get_by_task_id(&self, task_id: &str) -> Result<Option<ExportRecord>>;

    /// Inserts or replaces the record for `record.task_id`
    async fn update(&self, record: &ExportRecord) -> Result<()>;
}

/// Builds the status store selected by the configuration
///
/// # Errors
///
/// Returns an error if the PostgreSQL section is missing or the pool cannot
/// be created.
pub async fn create_status_store(
    config: &AppExportConfig,
) -> Result<Arc<dyn StatusStore + Send + Sync>> {
    match config.status.target {
        StatusTarget::File => {
            tracing::info!(path = %config.status.path.display(), "Using file status store");
            Ok(Arc::new(FileStatusStore::new(&config.status.path))
                as Arc<dyn StatusStore + Send + Sync>)
        }
        StatusTarget::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                AppExportError::Configuration(
                    "status.target = 'postgresql' requires a [postgresql] section".to_string(),
                )
            })?;

            tracing::info!(table = %pg_config.table, "Using PostgreSQL status store");
            let store = PostgresStatusStore::new(pg_config.clone()).await?;
            store.ensure_schema().await?;
            Ok(Arc::new(store) as Arc<dyn StatusStore + Send + Sync>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_factory_builds_file_store() {
        let dir = TempDir::new().unwrap();
        let mut config = AppExportConfig::default();
        config.status.path = dir.path().join("status.json");

        let store = create_status_store(&config).await.unwrap();
        assert!(store.get_by_task_id("t-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_factory_requires_postgres_section() {
        let mut config = AppExportConfig::default();
        config.status.target = StatusTarget::PostgreSQL;
        assert!(matches!(
            create_status_store(&config).await,
            Err(AppExportError::Configuration(_))
        ));
    }
}
