//! Source-media acquisition.
//!
//! Two steps, like the upstream origin requires: resolve the opaque file
//! reference to a storage path, then stream the bytes to a local file
//! namespaced by the job id, preserving the origin's extension.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Source-media API configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Base URL of the source-media API
    pub base_url: String,
    /// Bearer credential
    pub token: String,
    /// Resolve-call timeout
    pub resolve_timeout: Duration,
    /// Download timeout
    pub download_timeout: Duration,
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            resolve_timeout: Duration::from_secs(15),
            download_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    path: String,
}

/// Client for the source-media collaborator.
pub struct SourceClient {
    http: Client,
    config: SourceConfig,
}

impl SourceClient {
    pub fn new(config: SourceConfig) -> WorkerResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Resolve the opaque reference to its storage path.
    async fn resolve(&self, file_id: &str) -> WorkerResult<String> {
        let url = format!("{}/files/{}", self.config.base_url, file_id);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.token)
            .timeout(self.config.resolve_timeout)
            .send()
            .await
            .map_err(|e| WorkerError::acquire(format!("resolve request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WorkerError::acquire(format!(
                "resolve returned {} for file {}",
                response.status(),
                file_id
            )));
        }

        let resolved: ResolveResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::acquire(format!("resolve response unreadable: {}", e)))?;
        Ok(resolved.path)
    }

    /// Acquire the source media for a job: resolve, then stream to
    /// `dir/{job_id}.{ext}`.
    pub async fn acquire(
        &self,
        file_id: &str,
        job_id: &str,
        dir: impl AsRef<Path>,
    ) -> WorkerResult<PathBuf> {
        let storage_path = self.resolve(file_id).await?;
        let save_path = dir.as_ref().join(local_file_name(job_id, &storage_path));

        let url = format!("{}/content/{}", self.config.base_url, storage_path);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.token)
            .timeout(self.config.download_timeout)
            .send()
            .await
            .map_err(|e| WorkerError::acquire(format!("download request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(WorkerError::acquire(format!(
                "download returned {} for {}",
                response.status(),
                storage_path
            )));
        }

        let mut file = tokio::fs::File::create(&save_path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| WorkerError::acquire(format!("download interrupted: {}", e)))?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(job_id, path = %save_path.display(), "downloaded source media");
        Ok(save_path)
    }
}

/// Local file name for a job's source, keeping the origin's extension.
fn local_file_name(job_id: &str, storage_path: &str) -> String {
    match Path::new(storage_path).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.{}", job_id, ext),
        None => job_id.to_string(),
    }
}
