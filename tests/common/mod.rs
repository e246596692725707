//! Test doubles shared by the integration tests

#![allow(dead_code)]

use appexport::adapters::archive::TarGzArchiver;
use appexport::adapters::image::ImageService;
use appexport::adapters::remote::{RemoteFileFetcher, RemoteSession};
use appexport::adapters::status::{FileStatusStore, StatusStore};
use appexport::config::AppExportConfig;
use appexport::core::export::ExportCoordinator;
use appexport::domain::{
    AppExportError, ExportRecord, ExportRequest, ImageError, RegistryCredentials, RemoteEndpoint,
    Result,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::sync::watch;

/// Image service that writes placeholder tarballs and records every call
#[derive(Default)]
pub struct FakeImages {
    pub calls: Mutex<Vec<String>>,
    /// Images whose pull fails
    pub broken: Vec<String>,
    /// Flipped to `true` when the first pull happens
    pub on_pull: Option<watch::Sender<bool>>,
}

impl FakeImages {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ImageService for FakeImages {
    async fn pull(
        &self,
        reference: &str,
        _credentials: Option<&RegistryCredentials>,
        attempts: u32,
    ) -> std::result::Result<(), ImageError> {
        self.record(format!("pull {reference}"));
        if let Some(signal) = &self.on_pull {
            let _ = signal.send(true);
        }
        if self.broken.iter().any(|b| b == reference) {
            return Err(ImageError::PullFailed {
                image: reference.to_string(),
                attempts,
                message: "manifest unknown".to_string(),
            });
        }
        Ok(())
    }

    async fn tag(
        &self,
        source: &str,
        target: &str,
        _attempts: u32,
    ) -> std::result::Result<(), ImageError> {
        self.record(format!("tag {source} {target}"));
        Ok(())
    }

    async fn save(&self, reference: &str, dest: &Path) -> std::result::Result<(), ImageError> {
        self.record(format!("save {reference}"));
        std::fs::write(dest, reference).unwrap();
        Ok(())
    }

    async fn multi_save(
        &self,
        references: &[String],
        dest: &Path,
    ) -> std::result::Result<(), ImageError> {
        self.record(format!("multi_save {}", references.join(",")));
        std::fs::write(dest, references.join("\n")).unwrap();
        Ok(())
    }

    fn flattened_name(&self, source: &str) -> String {
        let last = source.rsplit('/').next().unwrap_or(source);
        if last.contains(':') {
            format!("goodrain.me/{last}")
        } else {
            format!("goodrain.me/{last}:latest")
        }
    }
}

/// Fetcher whose sessions write fixed bytes
#[derive(Default)]
pub struct FakeFetcher {
    pub fail: bool,
}

struct FakeSession {
    fail: bool,
}

#[async_trait]
impl RemoteFileFetcher for FakeFetcher {
    async fn connect(&self, _endpoint: &RemoteEndpoint) -> Result<Box<dyn RemoteSession>> {
        Ok(Box::new(FakeSession { fail: self.fail }))
    }
}

#[async_trait]
impl RemoteSession for FakeSession {
    async fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64> {
        if self.fail {
            return Err(AppExportError::RemoteFetch(format!("{remote_path}: not found")));
        }
        std::fs::write(local_path, b"slug-bytes").unwrap();
        Ok(10)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Status store that always fails to write
pub struct BrokenStatusStore;

#[async_trait]
impl StatusStore for BrokenStatusStore {
    async fn get_by_task_id(&self, _task_id: &str) -> Result<Option<ExportRecord>> {
        Ok(None)
    }

    async fn update(&self, _record: &ExportRecord) -> Result<()> {
        Err(AppExportError::StatusPersistFailed(
            "connection refused".to_string(),
        ))
    }
}

/// Coordinator wired to fakes, with a file status store at `status_path`
pub fn coordinator(images: Arc<FakeImages>, status_path: &Path) -> ExportCoordinator {
    coordinator_with_store(images, Arc::new(FileStatusStore::new(status_path)))
}

pub fn coordinator_with_store(
    images: Arc<FakeImages>,
    store: Arc<dyn StatusStore + Send + Sync>,
) -> ExportCoordinator {
    ExportCoordinator::new(
        AppExportConfig::default(),
        images,
        Arc::new(FakeFetcher::default()),
        store,
        Arc::new(TarGzArchiver::new()),
    )
}

/// Creates `<root>/<name>/metadata.json`
pub fn workspace(root: &Path, name: &str, manifest: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("metadata.json"), manifest).unwrap();
    dir
}

pub fn request(id: &str, format: &str, source_dir: &Path) -> ExportRequest {
    ExportRequest {
        event_id: id.to_string(),
        format: format.to_string(),
        source_dir: source_dir.to_path_buf(),
    }
}

/// Every file under `root` with its size and modification time
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, (u64, SystemTime)> {
    let mut files = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let entry = entry.unwrap();
            let meta = entry.metadata().unwrap();
            if meta.is_dir() {
                pending.push(entry.path());
            }
            files.insert(entry.path(), (meta.len(), meta.modified().unwrap()));
        }
    }
    files
}

/// Compose manifest used by the scenario tests
///
/// `a` (database) exposes `data` at `/var/lib/data`; `b` (web) depends on
/// `a`, inherits its public env, binds `data` at `/mnt/a-data` and asks for
/// a `ghost` volume `a` never declared. Two components share the display
/// name "测试".
pub const COMPOSE_MANIFEST: &str = r#"{
    "group_name": "shop",
    "apps": [
        {
            "service_cname": "database",
            "service_share_uuid": "a",
            "share_image": "hub.example.com/library/mysql:5.7",
            "memory": 512,
            "port_map_list": [{"container_port": 3306}],
            "service_env_map_list": [{"attr_name": "MYSQL_ROOT_PASSWORD", "attr_value": "**None**"}],
            "service_connect_info_map_list": [
                {"attr_name": "DB_HOST", "attr_value": "127.0.0.1"},
                {"attr_name": "DB_USER", "attr_value": "root"}
            ],
            "service_volume_map_list": [
                {"volume_name": "data", "volume_path": "/var/lib/data", "volume_type": "share-file"},
                {"volume_name": "cnf", "volume_path": "/etc/mysql/conf.d/my.cnf",
                 "volume_type": "config-file", "file_content": "[mysqld]\nport=3306\n"}
            ]
        },
        {
            "service_cname": "web",
            "service_share_uuid": "b",
            "share_image": "hub.example.com/shop/web:1.2",
            "memory": 128,
            "cmd": "serve --port 80",
            "service_env_map_list": [
                {"attr_name": "DB_USER", "attr_value": "shop"},
                {"attr_name": "DSN", "attr_value": "${DB_USER}@${DB_HOST}"}
            ],
            "dep_service_map_list": [{"dep_service_key": "a"}],
            "mnt_relation_list": [
                {"service_share_uuid": "a", "mnt_name": "data", "mnt_dir": "/mnt/a-data"},
                {"service_share_uuid": "a", "mnt_name": "ghost", "mnt_dir": "/mnt/ghost"}
            ]
        },
        {
            "service_cname": "\\u6d4b\\u8bd5",
            "service_share_uuid": "c",
            "share_image": "nginx:1.25"
        },
        {
            "service_cname": "\\u6d4b\\u8bd5",
            "service_share_uuid": "d",
            "share_image": "redis:7"
        }
    ]
}"#;
