//! HTTP artifact fetcher
//!
//! Artifacts are served at `<scheme>://<host>:<port>/<remote path>` with
//! basic authentication when the endpoint carries a user.

use super::{RemoteFileFetcher, RemoteSession};
use crate::config::{ArtifactsConfig, SecretString};
use crate::domain::errors::AppExportError;
use crate::domain::manifest::RemoteEndpoint;
use crate::domain::Result;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use std::path::Path;
use std::time::Duration;

/// [`RemoteFileFetcher`] over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpFileFetcher {
    client: Client,
    scheme: String,
}

impl HttpFileFetcher {
    pub fn new(config: &ArtifactsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| AppExportError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            scheme: config.scheme.clone(),
        })
    }
}

#[async_trait]
impl RemoteFileFetcher for HttpFileFetcher {
    async fn connect(&self, endpoint: &RemoteEndpoint) -> Result<Box<dyn RemoteSession>> {
        if endpoint.host.trim().is_empty() {
            return Err(AppExportError::RemoteFetch(
                "artifact endpoint has no host".to_string(),
            ));
        }

        let base_url = if endpoint.port.trim().is_empty() {
            format!("{}://{}", self.scheme, endpoint.host)
        } else {
            format!("{}://{}:{}", self.scheme, endpoint.host, endpoint.port)
        };
        tracing::debug!(base_url = %base_url, "Opened artifact session");

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            base_url,
            username: endpoint.username.clone(),
            password: endpoint.password.clone(),
        }))
    }
}

struct HttpSession {
    client: Client,
    base_url: String,
    username: String,
    password: SecretString,
}

impl HttpSession {
    fn url_for(&self, remote_path: &str) -> String {
        format!("{}/{}", self.base_url, remote_path.trim_start_matches('/'))
    }
}

#[async_trait]
impl RemoteSession for HttpSession {
    async fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64> {
        let url = self.url_for(remote_path);
        let mut request = self.client.get(&url);
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(self.password.expose_secret().as_str()));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppExportError::RemoteFetch(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppExportError::RemoteFetch(format!("GET {url}: HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppExportError::RemoteFetch(format!("read {url}: {e}")))?;

        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local_path, &body).await?;

        tracing::info!(url = %url, bytes = body.len(), dest = %local_path.display(), "Downloaded artifact");
        Ok(body.len() as u64)
    }

    async fn close(self: Box<Self>) -> Result<()> {
        tracing::debug!(base_url = %self.base_url, "Closed artifact session");
        Ok(())
    }
}
