//! Container image transfer
//!
//! The engine only sees [`ImageService`]; [`DockerCliImageService`] is the
//! production implementation driving the docker CLI.

pub mod docker;
pub mod reference;

use crate::domain::errors::ImageError;
use crate::domain::manifest::RegistryCredentials;
use async_trait::async_trait;
use std::path::Path;

pub use docker::DockerCliImageService;
pub use reference::ImageReference;

/// Image transfer operations against a container runtime
///
/// Attempt counts are the retry budget for that single call; the engine
/// never retries on its own.
#[async_trait]
pub trait ImageService: Send + Sync {
    /// Pulls `reference`, logging in first when credentials are given
    async fn pull(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
        attempts: u32,
    ) -> Result<(), ImageError>;

    /// Tags `source` as `target`
    async fn tag(&self, source: &str, target: &str, attempts: u32) -> Result<(), ImageError>;

    /// Saves one image to a tarball
    async fn save(&self, reference: &str, dest: &Path) -> Result<(), ImageError>;

    /// Saves several images into one tarball, sharing layers
    async fn multi_save(&self, references: &[String], dest: &Path) -> Result<(), ImageError>;

    /// Transfer-safe name for a source image
    fn flattened_name(&self, source: &str) -> String;
}

/// Pulls `source` and tags its flattened copy, returning the flattened name
pub async fn pull_and_flatten(
    images: &dyn ImageService,
    source: &str,
    credentials: Option<&RegistryCredentials>,
    pull_attempts: u32,
    tag_attempts: u32,
) -> Result<String, ImageError> {
    let flattened = images.flattened_name(source);
    images.pull(source, credentials, pull_attempts).await?;
    images.tag(source, &flattened, tag_attempts).await?;
    tracing::debug!(image = %source, flattened = %flattened, "Image flattened");
    Ok(flattened)
}
