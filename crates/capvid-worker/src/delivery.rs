//! Result delivery.
//!
//! Submits one multipart payload per finished job: the composed video, a
//! base64-encoded still frame, the recipient id and the upstream message
//! ids to retire. At-most-once: a failed submission is reported, never
//! retried, and the job is not re-queued.

use std::path::Path;
use std::time::Duration;

use base64::Engine;
use reqwest::multipart;
use reqwest::Client;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Client for the result-delivery collaborator.
pub struct DeliveryClient {
    http: Client,
    url: String,
}

impl DeliveryClient {
    pub fn new(url: impl Into<String>) -> WorkerResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Submit the finished artifacts for one job.
    pub async fn submit(
        &self,
        chat_id: i64,
        video_path: impl AsRef<Path>,
        frame_path: impl AsRef<Path>,
        messages_to_delete: &[i64],
    ) -> WorkerResult<()> {
        let video_bytes = tokio::fs::read(video_path.as_ref()).await?;
        let frame_bytes = tokio::fs::read(frame_path.as_ref()).await?;
        let image_data = base64::engine::general_purpose::STANDARD.encode(frame_bytes);

        let video_part = multipart::Part::bytes(video_bytes)
            .file_name("final_video.mp4")
            .mime_str("video/mp4")?;

        let form = multipart::Form::new()
            .part("video", video_part)
            .text("image_data", image_data)
            .text("chat_id", chat_id.to_string())
            .text(
                "messages_to_delete",
                serde_json::to_string(messages_to_delete)?,
            );

        let response = self
            .http
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| WorkerError::delivery(format!("submission failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::delivery(format!(
                "consumer returned {}: {}",
                status, body
            )));
        }

        info!(chat_id, "submitted result to consumer");
        Ok(())
    }
}
