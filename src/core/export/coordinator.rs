//! Export coordinator - main orchestrator for one export task
//!
//! Drives a task through the stages in [`super::stage`], talking to the
//! image service, artifact fetcher, archiver and status store only through
//! their traits. Every terminal transition writes exactly one status record.

use crate::adapters::archive::{Archiver, TarGzArchiver};
use crate::adapters::image::{DockerCliImageService, ImageService};
use crate::adapters::remote::{HttpFileFetcher, RemoteFileFetcher};
use crate::adapters::status::{create_status_store, StatusStore};
use crate::config::AppExportConfig;
use crate::core::compose::{self, DESCRIPTOR_FILE};
use crate::core::export::stage::{ExportStage, StageTracker};
use crate::core::export::staging::Stager;
use crate::core::export::summary::ExportReport;
use crate::core::export::workspace::{make_executable, reset_workspace, write_file};
use crate::core::manifest::{parse_legacy_manifest, parse_structured_manifest, read_manifest_bytes};
use crate::core::resolve::ResolvedApplication;
use crate::core::verification::{check_freshness, write_sidecar};
use crate::domain::errors::AppExportError;
use crate::domain::ids::TaskId;
use crate::domain::manifest::ApplicationManifest;
use crate::domain::task::{ExportFormat, ExportRecord, ExportRequest, ExportTask};
use crate::domain::Result;
use crate::logging::{EventLogger, EventSink};
use crate::{log_error_with_context, log_export_complete, log_export_start};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

/// Startup script written next to the compose descriptor
pub const STARTUP_SCRIPT_FILE: &str = "run.sh";

const EMBEDDED_STARTUP_SCRIPT: &str = include_str!("../../../assets/run.sh");

/// Reads the manifest in the shape the requested format expects
fn parse_manifest(format: ExportFormat, data: &[u8]) -> Result<ApplicationManifest> {
    match format {
        ExportFormat::PlatformNative => parse_legacy_manifest(data),
        ExportFormat::Compose => parse_structured_manifest(data),
    }
}

/// Identity of a workspace directory for batch de-duplication
///
/// Existing directories compare by canonical path; anything else falls back
/// to a lexical normalization.
fn workspace_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| {
        let mut key = PathBuf::new();
        for part in path.components() {
            match part {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !key.pop() {
                        key.push(part);
                    }
                }
                other => key.push(other),
            }
        }
        key
    })
}

/// Export coordinator
pub struct ExportCoordinator {
    config: AppExportConfig,
    images: Arc<dyn ImageService>,
    fetcher: Arc<dyn RemoteFileFetcher>,
    status_store: Arc<dyn StatusStore + Send + Sync>,
    archiver: Arc<dyn Archiver>,
    events: EventSink,
    shutdown_signal: Option<watch::Receiver<bool>>,
}

impl ExportCoordinator {
    /// Coordinator over explicit collaborators
    pub fn new(
        config: AppExportConfig,
        images: Arc<dyn ImageService>,
        fetcher: Arc<dyn RemoteFileFetcher>,
        status_store: Arc<dyn StatusStore + Send + Sync>,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        let events = EventSink::from_config(&config.events);
        Self {
            config,
            images,
            fetcher,
            status_store,
            archiver,
            events,
            shutdown_signal: None,
        }
    }

    /// Coordinator over the production collaborators selected by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact client or the status store cannot be
    /// created.
    pub async fn from_config(
        config: AppExportConfig,
        shutdown_signal: watch::Receiver<bool>,
    ) -> Result<Self> {
        let images = Arc::new(DockerCliImageService::new(
            &config.docker,
            config.export.registry_domain.clone(),
        ));
        let fetcher = Arc::new(HttpFileFetcher::new(&config.artifacts)?);
        let status_store = create_status_store(&config).await?;
        let archiver = Arc::new(TarGzArchiver::new());

        tracing::debug!(
            registry_domain = %config.export.registry_domain,
            docker = %config.docker.binary,
            "Export coordinator ready"
        );

        Ok(Self::new(config, images, fetcher, status_store, archiver)
            .with_shutdown_signal(shutdown_signal))
    }

    pub fn with_events(mut self, events: EventSink) -> Self {
        self.events = events;
        self
    }

    /// Stops tasks at the next stage boundary once the channel reads `true`
    pub fn with_shutdown_signal(mut self, shutdown_signal: watch::Receiver<bool>) -> Self {
        self.shutdown_signal = Some(shutdown_signal);
        self
    }

    pub fn status_store(&self) -> &Arc<dyn StatusStore + Send + Sync> {
        &self.status_store
    }

    /// Runs one dispatcher request
    ///
    /// An unknown format is recorded as a failed task before the error is
    /// returned.
    pub async fn execute(&self, request: &ExportRequest) -> Result<ExportReport> {
        let task_id = TaskId::new(request.event_id.as_str()).map_err(AppExportError::Validation)?;

        let format = match request.format.parse::<ExportFormat>() {
            Ok(format) => format,
            Err(e) => {
                log_error_with_context!(&e, "Rejecting export request");
                let record =
                    ExportRecord::failed_request(&task_id, &request.format, &request.source_dir);
                if let Err(persist) = self.status_store.update(&record).await {
                    log_error_with_context!(&persist, "Failed to record rejected request");
                }
                return Err(e);
            }
        };

        self.run(ExportTask::new(task_id, format, request.source_dir.clone()))
            .await
    }

    /// Runs several requests concurrently, one task per distinct id
    ///
    /// Results come back in request order.
    ///
    /// # Errors
    ///
    /// Returns a validation error, before any task starts, when two requests
    /// share a task id or point at the same workspace.
    pub async fn run_many(&self, requests: &[ExportRequest]) -> Result<Vec<Result<ExportReport>>> {
        let mut ids = HashSet::with_capacity(requests.len());
        let mut workspaces = HashSet::with_capacity(requests.len());
        for request in requests {
            if !ids.insert(request.event_id.as_str()) {
                return Err(AppExportError::Validation(format!(
                    "duplicate task id '{}' in batch",
                    request.event_id
                )));
            }
            if !workspaces.insert(workspace_key(&request.source_dir)) {
                return Err(AppExportError::Validation(format!(
                    "duplicate workspace '{}' in batch",
                    request.source_dir.display()
                )));
            }
        }

        tracing::info!(tasks = requests.len(), "Running export batch");
        let runs = requests.iter().map(|request| self.execute(request));
        Ok(futures::future::join_all(runs).await)
    }

    /// Drives `task` to a terminal state
    pub async fn run(&self, mut task: ExportTask) -> Result<ExportReport> {
        let start = Instant::now();
        let events = self.events.logger_for(&task.id);
        let archive_path = task.archive_path(self.config.export.archive_extension());
        let mut report = ExportReport::new(task.id.clone(), task.format, archive_path);
        let mut stages = StageTracker::new();

        log_export_start!(&task.id, task.format);
        events.info(
            "Start exporting application",
            &[
                ("step", "export-app"),
                ("status", "start"),
                ("format", task.format.as_str()),
            ],
        );

        let mut result = self
            .run_stages(&task, &mut stages, events.as_ref(), &mut report)
            .await;
        if result.is_ok() {
            result = stages.advance(ExportStage::Succeeded);
        }

        match &result {
            Ok(()) => {
                task.mark_succeeded();
                events.info(
                    "Application exported",
                    &[("step", "export-app"), ("status", "success")],
                );
            }
            Err(e) => {
                stages.fail();
                task.mark_failed();
                log_error_with_context!(e, "Export failed");
                let message = e.to_string();
                events.error(
                    "Failed to export application",
                    &[
                        ("step", "export-app"),
                        ("status", "failure"),
                        ("error", message.as_str()),
                    ],
                );
            }
        }

        report.status = task.status;
        report.status_persisted = self.persist_status(&task).await;
        report.stages = stages.history().to_vec();
        report.error = result.as_ref().err().map(ToString::to_string);
        let report = report.with_duration(start.elapsed());
        report.log_summary();

        match result {
            Ok(()) => {
                log_export_complete!(&task.id, report.components, report.duration);
                Ok(report)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_stages(
        &self,
        task: &ExportTask,
        stages: &mut StageTracker,
        events: &dyn EventLogger,
        report: &mut ExportReport,
    ) -> Result<()> {
        stages.advance(ExportStage::CheckingFreshness)?;
        let freshness = check_freshness(&task.checksum_path(), &report.archive_path);
        if freshness.is_fresh() {
            tracing::info!(
                task_id = %task.id,
                archive = %report.archive_path.display(),
                "Manifest unchanged and archive present, skipping export"
            );
            report.cached = true;
            return Ok(());
        }
        tracing::debug!(task_id = %task.id, freshness = ?freshness, "Export required");

        self.ensure_running(ExportStage::CleaningWorkspace)?;
        stages.advance(ExportStage::CleaningWorkspace)?;
        let workspace = task.workspace();
        let manifest_bytes = read_manifest_bytes(workspace)?;
        let manifest = parse_manifest(task.format, &manifest_bytes)?;
        reset_workspace(workspace, &manifest_bytes).await?;

        self.ensure_running(ExportStage::StagingArtifacts)?;
        stages.advance(ExportStage::StagingArtifacts)?;
        let stager = Stager::new(
            workspace,
            &self.config.export,
            self.images.as_ref(),
            self.fetcher.as_ref(),
            events,
        );
        let outcome = match task.format {
            ExportFormat::PlatformNative => stager.stage_platform_native(&manifest).await?,
            ExportFormat::Compose => {
                let (resolved, outcome) = stager.stage_compose(&manifest).await?;

                self.ensure_running(ExportStage::GeneratingDescriptor)?;
                stages.advance(ExportStage::GeneratingDescriptor)?;
                self.write_descriptor(workspace, &resolved).await?;
                outcome
            }
        };
        report.components = outcome.components;
        report.images_saved = outcome.images_saved;
        report.artifacts_copied = outcome.artifacts_copied;
        report.warnings = outcome.warnings;

        self.ensure_running(ExportStage::Archiving)?;
        stages.advance(ExportStage::Archiving)?;
        events.info("Start packaging application", &[("step", "archive")]);
        self.archiver
            .archive(workspace, &report.archive_path)
            .await?;
        write_sidecar(&task.manifest_path(), &task.checksum_path())?;

        Ok(())
    }

    /// Writes the compose descriptor and the startup script
    async fn write_descriptor(&self, workspace: &Path, resolved: &ResolvedApplication) -> Result<()> {
        let descriptor = compose::build(resolved, |image| self.images.flattened_name(image));
        write_file(&workspace.join(DESCRIPTOR_FILE), descriptor.to_yaml()?).await?;

        let script = match &self.config.export.startup_script {
            Some(path) => tokio::fs::read(path).await.map_err(|e| {
                AppExportError::Configuration(format!(
                    "Failed to read startup script {}: {e}",
                    path.display()
                ))
            })?,
            None => EMBEDDED_STARTUP_SCRIPT.as_bytes().to_vec(),
        };
        let script_path = workspace.join(STARTUP_SCRIPT_FILE);
        write_file(&script_path, script).await?;
        make_executable(&script_path).await?;

        tracing::debug!(
            services = descriptor.services.len(),
            volumes = descriptor.volumes.len(),
            "Compose descriptor written"
        );
        Ok(())
    }

    /// One status update per terminal transition; failures are logged only
    async fn persist_status(&self, task: &ExportTask) -> bool {
        match self.status_store.update(&task.record()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    task_id = %task.id,
                    status = %task.status,
                    error = %e,
                    "Failed to persist terminal status"
                );
                false
            }
        }
    }

    fn ensure_running(&self, next: ExportStage) -> Result<()> {
        let requested = self
            .shutdown_signal
            .as_ref()
            .is_some_and(|signal| *signal.borrow());
        if requested {
            tracing::warn!(next_stage = %next, "Shutdown requested, stopping export");
            return Err(AppExportError::Interrupted(format!(
                "shutdown requested before {next}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::remote::RemoteSession;
    use crate::adapters::status::FileStatusStore;
    use crate::domain::manifest::{RegistryCredentials, RemoteEndpoint};
    use crate::domain::task::TaskStatus;
    use crate::domain::ImageError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct NoopImages;

    #[async_trait]
    impl ImageService for NoopImages {
        async fn pull(
            &self,
            _reference: &str,
            _credentials: Option<&RegistryCredentials>,
            _attempts: u32,
        ) -> std::result::Result<(), ImageError> {
            Ok(())
        }

        async fn tag(
            &self,
            _source: &str,
            _target: &str,
            _attempts: u32,
        ) -> std::result::Result<(), ImageError> {
            Ok(())
        }

        async fn save(&self, _reference: &str, dest: &Path) -> std::result::Result<(), ImageError> {
            std::fs::write(dest, b"image").unwrap();
            Ok(())
        }

        async fn multi_save(
            &self,
            _references: &[String],
            dest: &Path,
        ) -> std::result::Result<(), ImageError> {
            std::fs::write(dest, b"images").unwrap();
            Ok(())
        }

        fn flattened_name(&self, source: &str) -> String {
            format!("goodrain.me/{source}")
        }
    }

    struct NoFetcher;

    #[async_trait]
    impl RemoteFileFetcher for NoFetcher {
        async fn connect(&self, endpoint: &RemoteEndpoint) -> Result<Box<dyn RemoteSession>> {
            Err(AppExportError::RemoteFetch(format!(
                "no route to {}",
                endpoint.host
            )))
        }
    }

    fn coordinator(dir: &TempDir) -> ExportCoordinator {
        ExportCoordinator::new(
            AppExportConfig::default(),
            Arc::new(NoopImages),
            Arc::new(NoFetcher),
            Arc::new(FileStatusStore::new(dir.path().join("status.json"))),
            Arc::new(TarGzArchiver::new()),
        )
    }

    fn workspace(dir: &TempDir, manifest: &str) -> std::path::PathBuf {
        let workspace = dir.path().join("shop-1.0");
        std::fs::create_dir_all(&workspace).unwrap();
        std::fs::write(workspace.join("metadata.json"), manifest).unwrap();
        workspace
    }

    fn request(id: &str, format: &str, source_dir: &Path) -> ExportRequest {
        ExportRequest {
            event_id: id.to_string(),
            format: format.to_string(),
            source_dir: source_dir.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn test_compose_export_writes_bundle() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(
            &dir,
            r#"{"group_name": "shop", "apps": [
                {"service_cname": "web", "service_share_uuid": "w", "share_image": "nginx:1.25"}
            ]}"#,
        );
        let coordinator = coordinator(&dir);

        let report = coordinator
            .execute(&request("t-1", "docker-compose", &ws))
            .await
            .unwrap();

        assert!(report.is_successful());
        assert!(report.status_persisted);
        assert_eq!(
            report.stages,
            vec![
                ExportStage::Created,
                ExportStage::CheckingFreshness,
                ExportStage::CleaningWorkspace,
                ExportStage::StagingArtifacts,
                ExportStage::GeneratingDescriptor,
                ExportStage::Archiving,
                ExportStage::Succeeded,
            ]
        );
        assert!(ws.join(DESCRIPTOR_FILE).is_file());
        assert!(ws.join(STARTUP_SCRIPT_FILE).is_file());
        assert!(ws.join("component-images.tar").is_file());
        assert!(ws.join("metadata.json.md5").is_file());
        assert!(dir.path().join("shop-1.0.tar.gz").is_file());

        let record = coordinator
            .status_store()
            .get_by_task_id("t-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn test_unsupported_format_records_failure() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, "{}");
        let coordinator = coordinator(&dir);

        let err = coordinator
            .execute(&request("t-2", "helm-chart", &ws))
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::UnsupportedFormat(_)));

        let record = coordinator
            .status_store()
            .get_by_task_id("t-2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.format, "helm-chart");
    }

    #[tokio::test]
    async fn test_malformed_manifest_leaves_workspace_untouched() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, r#"{"apps": []}"#);
        std::fs::write(ws.join("leftover.txt"), b"keep").unwrap();
        let coordinator = coordinator(&dir);

        let err = coordinator
            .execute(&request("t-3", "rainbond-app", &ws))
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::ManifestMalformed(_)));
        assert!(ws.join("leftover.txt").is_file());
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_before_cleaning() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(
            &dir,
            r#"{"apps": [{"service_cname": "web", "share_image": "nginx"}]}"#,
        );
        let (tx, rx) = watch::channel(false);
        let coordinator = coordinator(&dir).with_shutdown_signal(rx);
        tx.send(true).unwrap();

        let err = coordinator
            .execute(&request("t-4", "rainbond-app", &ws))
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::Interrupted(_)));
        assert_eq!(err.exit_code(), 130);

        let record = coordinator
            .status_store()
            .get_by_task_id("t-4")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_run_many_rejects_duplicate_ids() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir, "{}");
        let coordinator = coordinator(&dir);

        let err = coordinator
            .run_many(&[
                request("dup", "docker-compose", &ws),
                request("dup", "rainbond-app", &ws),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::Validation(_)));
        assert!(coordinator
            .status_store()
            .get_by_task_id("dup")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_run_many_rejects_shared_workspace() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(
            &dir,
            r#"{"group_name": "shop", "apps": [{"service_cname": "web", "service_share_uuid": "w"}]}"#,
        );
        std::fs::create_dir_all(dir.path().join("other")).unwrap();
        let aliased = dir.path().join("other/../shop-1.0/.");
        let coordinator = coordinator(&dir);

        let err = coordinator
            .run_many(&[
                request("a", "docker-compose", &ws),
                request("b", "rainbond-app", &aliased),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::Validation(ref m) if m.contains("workspace")));
        for id in ["a", "b"] {
            assert!(coordinator
                .status_store()
                .get_by_task_id(id)
                .await
                .unwrap()
                .is_none());
        }
        assert!(!dir.path().join("shop-1.0.tar.gz").exists());
    }

    #[test]
    fn test_workspace_key_normalizes_missing_paths() {
        assert_eq!(
            workspace_key(Path::new("/no/such/./dir/../ws")),
            workspace_key(Path::new("/no/such/ws"))
        );
        assert_ne!(
            workspace_key(Path::new("/no/such/a")),
            workspace_key(Path::new("/no/such/b"))
        );
    }

    #[tokio::test]
    async fn test_missing_remote_artifact_fails_task() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(
            &dir,
            r#"{"apps": [{"service_cname": "legacy", "share_slug_path": "/nowhere/v1.tgz",
                "service_slug": {"ftp_host": "10.0.0.9"}}]}"#,
        );
        let coordinator = coordinator(&dir);

        let err = coordinator
            .execute(&request("t-5", "rainbond-app", &ws))
            .await
            .unwrap_err();
        assert!(matches!(err, AppExportError::RemoteFetch(_)));
        assert!(!dir.path().join("shop-1.0.tar.gz").exists());
    }
}
