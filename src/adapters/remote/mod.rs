//! Remote build-artifact transfer
//!
//! Legacy image-less apps ship a build artifact that may only exist on the
//! artifact host. A [`RemoteFileFetcher`] opens a [`RemoteSession`] per
//! endpoint; sessions are closed explicitly once the download is done.

pub mod http;

use crate::domain::manifest::RemoteEndpoint;
use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

pub use http::HttpFileFetcher;

/// Opens sessions against artifact hosts
#[async_trait]
pub trait RemoteFileFetcher: Send + Sync {
    async fn connect(&self, endpoint: &RemoteEndpoint) -> Result<Box<dyn RemoteSession>>;
}

/// An open connection to one artifact host
#[async_trait]
pub trait RemoteSession: Send {
    /// Downloads `remote_path` to `local_path`, returning the byte count
    async fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<u64>;

    async fn close(self: Box<Self>) -> Result<()>;
}
