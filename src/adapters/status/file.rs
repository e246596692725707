//! JSON-file status store
//!
//! All records live in one JSON object keyed by task id. Writes go through a
//! temporary file and a rename; an in-process lock serializes concurrent
//! tasks sharing the store.

use super::StatusStore;
use crate::domain::errors::AppExportError;
use crate::domain::task::ExportRecord;
use crate::domain::Result;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Records = IndexMap<String, ExportRecord>;

/// [`StatusStore`] persisted to a local JSON document
#[derive(Debug)]
pub struct FileStatusStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStatusStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Records> {
        match tokio::fs::read(&self.path).await {
            Ok(data) if data.iter().all(u8::is_ascii_whitespace) => Ok(Records::new()),
            Ok(data) => serde_json::from_slice(&data).map_err(|e| {
                AppExportError::StatusPersistFailed(format!(
                    "corrupt status file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(AppExportError::StatusPersistFailed(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn store(&self, records: &Records) -> Result<()> {
        let persist = |e: std::io::Error| {
            AppExportError::StatusPersistFailed(format!("write {}: {e}", self.path.display()))
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(persist)?;
        }

        let data = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await.map_err(persist)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(persist)?;
        Ok(())
    }
}

#[async_trait]
impl StatusStore for FileStatusStore {
    async fn get_by_task_id(&self, task_id: &str) -> Result<Option<ExportRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.get(task_id).cloned())
    }

    async fn update(&self, record: &ExportRecord) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.insert(record.task_id.clone(), record.clone());
        self.store(&records).await?;

        tracing::debug!(
            task_id = %record.task_id,
            status = %record.status,
            "Status record written"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::TaskStatus;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(task_id: &str, status: TaskStatus) -> ExportRecord {
        ExportRecord {
            task_id: task_id.to_string(),
            format: "docker-compose".to_string(),
            source_dir: PathBuf::from("/data/export/shop"),
            status,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_update_and_get() {
        let dir = TempDir::new().unwrap();
        let store = FileStatusStore::new(dir.path().join("nested/status.json"));

        assert!(store.get_by_task_id("t-1").await.unwrap().is_none());

        store.update(&record("t-1", TaskStatus::Running)).await.unwrap();
        store.update(&record("t-2", TaskStatus::Failed)).await.unwrap();
        store.update(&record("t-1", TaskStatus::Success)).await.unwrap();

        let t1 = store.get_by_task_id("t-1").await.unwrap().unwrap();
        assert_eq!(t1.status, TaskStatus::Success);
        let t2 = store.get_by_task_id("t-2").await.unwrap().unwrap();
        assert_eq!(t2.status, TaskStatus::Failed);
        assert!(!dir.path().join("nested/status.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_persist_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileStatusStore::new(&path);
        assert!(matches!(
            store.update(&record("t-1", TaskStatus::Success)).await,
            Err(AppExportError::StatusPersistFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_updates_keep_all_records() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(FileStatusStore::new(dir.path().join("status.json")));

        let updates = (0..8).map(|i| {
            let store = store.clone();
            async move { store.update(&record(&format!("t-{i}"), TaskStatus::Success)).await }
        });
        for result in futures::future::join_all(updates).await {
            result.unwrap();
        }

        for i in 0..8 {
            assert!(store.get_by_task_id(&format!("t-{i}")).await.unwrap().is_some());
        }
    }
}
