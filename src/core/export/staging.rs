//! Artifact staging
//!
//! Fills a freshly reset workspace with everything the archive needs:
//!
//! - **platform-native**: one directory per component holding its config
//!   files and either its image tarball or its build artifact, plus one
//!   directory per plugin image
//! - **compose**: one directory per resolved service holding its config
//!   files, and a single bulk image tarball for every component image

use crate::adapters::image::{pull_and_flatten, ImageService};
use crate::adapters::remote::RemoteFileFetcher;
use crate::config::ExportConfig;
use crate::core::export::workspace::{create_dir, write_file};
use crate::core::naming::{linux_file_name, sanitize, ServiceNameRegistry};
use crate::core::resolve::volumes::clean_join;
use crate::core::resolve::{resolve, ResolvedApplication};
use crate::domain::errors::{AppExportError, ResolveWarning};
use crate::domain::manifest::{
    ApplicationManifest, Component, PluginImage, RegistryCredentials, SlugArtifact,
};
use crate::domain::Result;
use crate::logging::EventLogger;
use secrecy::ExposeSecret;
use std::path::{Path, PathBuf};

/// Bulk image tarball written on the compose path
pub const BULK_IMAGE_ARCHIVE: &str = "component-images.tar";

/// Suffix of per-app image tarballs
pub const IMAGE_TAR_SUFFIX: &str = ".image.tar";

/// What staging produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagingOutcome {
    pub components: usize,
    pub images_saved: usize,
    pub artifacts_copied: usize,
    pub warnings: Vec<ResolveWarning>,
}

/// Collaborators and settings for staging one workspace
pub struct Stager<'a> {
    workspace: &'a Path,
    config: &'a ExportConfig,
    images: &'a dyn ImageService,
    fetcher: &'a dyn RemoteFileFetcher,
    events: &'a dyn EventLogger,
}

impl<'a> Stager<'a> {
    pub fn new(
        workspace: &'a Path,
        config: &'a ExportConfig,
        images: &'a dyn ImageService,
        fetcher: &'a dyn RemoteFileFetcher,
        events: &'a dyn EventLogger,
    ) -> Self {
        Self {
            workspace,
            config,
            images,
            fetcher,
            events,
        }
    }

    /// Stages every component under its display name, then every plugin
    pub async fn stage_platform_native(
        &self,
        manifest: &ApplicationManifest,
    ) -> Result<StagingOutcome> {
        let mut outcome = StagingOutcome::default();

        for component in &manifest.components {
            self.stage_app(component, &mut outcome).await?;
            outcome.components += 1;
        }

        for plugin in &manifest.plugins {
            self.stage_plugin(plugin).await?;
            outcome.images_saved += 1;
        }

        Ok(outcome)
    }

    async fn stage_app(&self, app: &Component, outcome: &mut StagingOutcome) -> Result<()> {
        let app_name = sanitize(&app.display_name);
        let app_dir = self.workspace.join(&app_name);
        create_dir(&app_dir).await?;

        for volume in app.volumes.iter().filter(|v| v.is_config_file()) {
            let path = self
                .workspace
                .join(clean_join(&app_name, &volume.mount_path));
            write_file(&path, volume.file_content.as_deref().unwrap_or_default()).await?;
            tracing::debug!(app = %app_name, path = %path.display(), "Config file written");
        }

        if let Some(image) = &app.image {
            if self.is_runner_image(image) {
                tracing::debug!(app = %app_name, image = %image, "Skipping runner image");
                return Ok(());
            }
            let credentials = self.credentials_or_default(app.credentials.clone());
            let dest = app_dir.join(image_tar_name(image));
            self.export_image(image, credentials.as_ref(), &dest).await?;
            outcome.images_saved += 1;
        } else if let Some(slug) = &app.slug {
            let dest = app_dir.join(linux_file_name(&slug.path));
            self.export_slug(slug, &dest).await?;
            outcome.artifacts_copied += 1;
        }

        Ok(())
    }

    async fn stage_plugin(&self, plugin: &PluginImage) -> Result<()> {
        let plugin_dir = self.workspace.join(sanitize(&plugin.name));
        create_dir(&plugin_dir).await?;

        let credentials = self.credentials_or_default(plugin.credentials.clone());
        let dest = plugin_dir.join(image_tar_name(&plugin.image));
        self.export_image(&plugin.image, credentials.as_ref(), &dest)
            .await
    }

    /// Pull, flatten, and save one image into `dest`
    async fn export_image(
        &self,
        image: &str,
        credentials: Option<&RegistryCredentials>,
        dest: &Path,
    ) -> Result<()> {
        let dest_str = dest.display().to_string();
        self.events.info(
            "Start exporting image",
            &[("step", "export-image"), ("image", image)],
        );

        let flattened = pull_and_flatten(
            self.images,
            image,
            credentials,
            self.config.pull_attempts,
            self.config.tag_attempts,
        )
        .await
        .map_err(|e| self.image_failure(image, e))?;

        self.images
            .save(&flattened, dest)
            .await
            .map_err(|e| self.image_failure(image, e))?;

        self.events.info(
            "Image exported",
            &[("step", "export-image"), ("image", image), ("dest", dest_str.as_str())],
        );
        Ok(())
    }

    /// Copies the build artifact locally, downloading it when no local copy
    /// is usable
    async fn export_slug(&self, slug: &SlugArtifact, dest: &Path) -> Result<()> {
        let local = Path::new(&slug.path);
        if local.is_file() {
            match tokio::fs::copy(local, dest).await {
                Ok(bytes) => {
                    tracing::debug!(src = %slug.path, bytes, "Build artifact copied");
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(src = %slug.path, error = %e, "Local copy failed, downloading");
                }
            }
        }

        let mut session = self.fetcher.connect(&slug.endpoint).await.map_err(|e| {
            self.events.error(
                "Failed to connect to artifact host",
                &[("step", "export-slug"), ("host", slug.endpoint.host.as_str())],
            );
            e
        })?;

        let downloaded = session.download(&slug.path, dest).await;
        if let Err(e) = session.close().await {
            tracing::warn!(host = %slug.endpoint.host, error = %e, "Closing artifact session failed");
        }

        match downloaded {
            Ok(bytes) => {
                tracing::debug!(src = %slug.path, bytes, "Build artifact downloaded");
                Ok(())
            }
            Err(e) => {
                self.events.error(
                    "Failed to download build artifact",
                    &[("step", "export-slug"), ("path", slug.path.as_str())],
                );
                Err(e)
            }
        }
    }

    /// Resolves the structured manifest and stages every component
    ///
    /// Returns the resolved application for the descriptor stage.
    pub async fn stage_compose(
        &self,
        manifest: &ApplicationManifest,
    ) -> Result<(ResolvedApplication, StagingOutcome)> {
        let registry = ServiceNameRegistry::build(&manifest.components);
        let resolved = resolve(manifest, &registry);

        let mut outcome = StagingOutcome {
            warnings: resolved.warnings.clone(),
            ..Default::default()
        };
        let mut flattened = Vec::new();

        for component in resolved.components.values() {
            create_dir(&self.workspace.join(&component.service_name)).await?;

            for file in &component.config_files {
                write_file(&self.workspace.join(&file.relative_path), &file.content).await?;
            }

            if let Some(image) = &component.image {
                let credentials = self.credentials_or_default(component.credentials.clone());
                self.events.info(
                    "Start exporting image",
                    &[("step", "export-image"), ("service", component.service_name.as_str())],
                );
                let name = pull_and_flatten(
                    self.images,
                    image,
                    credentials.as_ref(),
                    self.config.pull_attempts,
                    self.config.tag_attempts,
                )
                .await
                .map_err(|e| self.image_failure(image, e))?;
                if !flattened.contains(&name) {
                    flattened.push(name);
                }
            }
            outcome.components += 1;
        }

        if flattened.is_empty() {
            tracing::info!("No component images, skipping bulk image save");
        } else {
            let dest = self.bulk_archive_path();
            self.images
                .multi_save(&flattened, &dest)
                .await
                .map_err(|e| self.image_failure(&flattened.join(" "), e))?;
            self.events.info(
                "Component images saved",
                &[("step", "save-images"), ("count", flattened.len().to_string().as_str())],
            );
            outcome.images_saved = flattened.len();
        }

        Ok((resolved, outcome))
    }

    pub fn bulk_archive_path(&self) -> PathBuf {
        self.workspace.join(BULK_IMAGE_ARCHIVE)
    }

    fn is_runner_image(&self, image: &str) -> bool {
        let marker = self.config.runner_image_marker.trim();
        !marker.is_empty() && image.contains(marker)
    }

    /// Manifest credentials, falling back to the configured default account
    fn credentials_or_default(
        &self,
        credentials: Option<RegistryCredentials>,
    ) -> Option<RegistryCredentials> {
        credentials.or_else(|| {
            let user = self.config.default_registry_user.as_deref()?;
            let password = self
                .config
                .default_registry_password
                .as_ref()
                .map(|p| p.expose_secret().as_str().to_string())
                .unwrap_or_default();
            RegistryCredentials::from_parts(user, &password)
        })
    }

    fn image_failure(&self, image: &str, error: crate::domain::ImageError) -> AppExportError {
        self.events.error(
            "Image export failed",
            &[("step", "export-image"), ("image", image)],
        );
        AppExportError::from(error)
    }
}

/// `<linux file name>.image.tar`
pub fn image_tar_name(image: &str) -> String {
    format!("{}{}", linux_file_name(image), IMAGE_TAR_SUFFIX)
}
