//! Docker CLI image service
//!
//! Every operation is one `docker` invocation through `tokio::process`,
//! bounded by the configured command timeout. Children are killed when a
//! timeout drops them.

use super::reference::ImageReference;
use super::ImageService;
use crate::config::DockerConfig;
use crate::domain::errors::ImageError;
use crate::domain::manifest::RegistryCredentials;
use crate::log_retry_attempt;
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// [`ImageService`] backed by the docker command line
#[derive(Debug, Clone)]
pub struct DockerCliImageService {
    binary: String,
    timeout: Duration,
    registry_domain: String,
}

impl DockerCliImageService {
    pub fn new(config: &DockerConfig, registry_domain: impl Into<String>) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: Duration::from_secs(config.command_timeout_secs),
            registry_domain: registry_domain.into(),
        }
    }

    /// Runs one CLI command, feeding `stdin` when given
    async fn run(&self, args: &[&str], stdin: Option<&str>) -> Result<Output, ImageError> {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command
            .spawn()
            .map_err(|e| ImageError::CommandUnavailable(format!("{}: {}", self.binary, e)))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(|e| ImageError::CommandUnavailable(format!("write stdin: {e}")))?;
            drop(pipe);
        }

        tokio::select! {
            output = child.wait_with_output() => {
                output.map_err(|e| ImageError::CommandUnavailable(format!("{}: {}", self.binary, e)))
            }
            _ = tokio::time::sleep(self.timeout) => {
                tracing::error!(
                    command = %args.first().copied().unwrap_or_default(),
                    timeout_secs = self.timeout.as_secs(),
                    "Docker command timed out"
                );
                Err(ImageError::Timeout(format!("{} {}", self.binary, args.join(" "))))
            }
        }
    }

    async fn login(&self, reference: &str, credentials: &RegistryCredentials) -> Result<(), ImageError> {
        let registry = ImageReference::parse(reference).registry;
        let mut args = vec!["login", "--username", credentials.username.as_str(), "--password-stdin"];
        if let Some(host) = registry.as_deref() {
            args.push(host);
        }

        let output = self
            .run(&args, Some(credentials.password.expose_secret().as_str()))
            .await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImageError::LoginFailed {
                registry: registry.unwrap_or_else(|| "docker.io".to_string()),
                message: stderr_of(&output),
            })
        }
    }

    /// Runs a command up to `attempts` times, returning the last failure
    async fn run_with_attempts(&self, args: &[&str], attempts: u32) -> Result<(), String> {
        let attempts = attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.run(args, None).await {
                Ok(output) if output.status.success() => return Ok(()),
                Ok(output) => last_error = stderr_of(&output),
                Err(ImageError::CommandUnavailable(message)) => return Err(message),
                Err(e) => last_error = e.to_string(),
            }
            if attempt < attempts {
                log_retry_attempt!(attempt, attempts, last_error.as_str());
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl ImageService for DockerCliImageService {
    async fn pull(
        &self,
        reference: &str,
        credentials: Option<&RegistryCredentials>,
        attempts: u32,
    ) -> Result<(), ImageError> {
        if let Some(credentials) = credentials {
            self.login(reference, credentials).await?;
        }

        tracing::info!(image = %reference, "Pulling image");
        self.run_with_attempts(&["pull", reference], attempts)
            .await
            .map_err(|message| ImageError::PullFailed {
                image: reference.to_string(),
                attempts: attempts.max(1),
                message,
            })
    }

    async fn tag(&self, source: &str, target: &str, attempts: u32) -> Result<(), ImageError> {
        self.run_with_attempts(&["tag", source, target], attempts)
            .await
            .map_err(|message| ImageError::TagFailed {
                source_image: source.to_string(),
                target: target.to_string(),
                message,
            })
    }

    async fn save(&self, reference: &str, dest: &Path) -> Result<(), ImageError> {
        self.multi_save(&[reference.to_string()], dest).await
    }

    async fn multi_save(&self, references: &[String], dest: &Path) -> Result<(), ImageError> {
        let dest_str = dest.to_string_lossy();
        let mut args: Vec<&str> = vec!["save", "-o", dest_str.as_ref()];
        args.extend(references.iter().map(String::as_str));

        tracing::info!(images = references.len(), dest = %dest.display(), "Saving images");
        let output = self.run(&args, None).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ImageError::SaveFailed {
                images: references.join(" "),
                dest: dest.display().to_string(),
                message: stderr_of(&output),
            })
        }
    }

    fn flattened_name(&self, source: &str) -> String {
        ImageReference::parse(source).flattened(&self.registry_domain)
    }
}

fn stderr_of(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        format!("exit status {}", output.status)
    } else {
        stderr
    }
}
