//! Worker configuration.
//!
//! Everything comes from named environment settings. A missing required
//! setting is a fatal startup error, never a per-job failure.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{WorkerError, WorkerResult};

/// Default deployment-control GraphQL endpoint.
const DEFAULT_DEPLOY_API_URL: &str = "https://backboard.railway.app/graphql/v2";

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis URL of the job queue
    pub queue_redis_url: String,
    /// Base URL of the source-media API
    pub source_api_base: String,
    /// Credential for the source-media API
    pub source_api_token: String,
    /// Result-delivery endpoint
    pub delivery_url: String,
    /// Deployment-control GraphQL endpoint
    pub deploy_api_url: String,
    /// Deployment-control credential
    pub deploy_api_token: String,
    /// Service whose deployment is stopped at shutdown
    pub deploy_service_id: String,
    /// Liveness-endpoint listen port
    pub port: u16,
    /// Directory for downloaded source media
    pub download_dir: PathBuf,
    /// Directory for rendered outputs
    pub output_dir: PathBuf,
    /// How long the probe path stays available for liveness checks
    pub probe_window: Duration,
    /// Grace delay after draining, before requesting shutdown
    pub drain_grace: Duration,
    /// Caption font path override
    pub font_path: Option<String>,
}

fn require(name: &str) -> WorkerResult<String> {
    std::env::var(name).map_err(|_| {
        WorkerError::config(format!("required environment variable {} is not set", name))
    })
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        Ok(Self {
            queue_redis_url: require("QUEUE_REDIS_URL")?,
            source_api_base: require("SOURCE_API_BASE")?,
            source_api_token: require("SOURCE_API_TOKEN")?,
            delivery_url: require("DELIVERY_URL")?,
            deploy_api_url: std::env::var("DEPLOY_API_URL")
                .unwrap_or_else(|_| DEFAULT_DEPLOY_API_URL.to_string()),
            deploy_api_token: require("DEPLOY_API_TOKEN")?,
            deploy_service_id: require("DEPLOY_SERVICE_ID")?,
            port: parsed_or("PORT", 8080),
            download_dir: PathBuf::from(
                std::env::var("DOWNLOAD_DIR").unwrap_or_else(|_| "downloads".to_string()),
            ),
            output_dir: PathBuf::from(
                std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "outputs".to_string()),
            ),
            probe_window: Duration::from_secs(parsed_or("PROBE_WINDOW_SECS", 60)),
            drain_grace: Duration::from_secs(parsed_or("DRAIN_GRACE_SECS", 0)),
            font_path: std::env::var("CAPTION_FONT_PATH").ok(),
        })
    }
}
