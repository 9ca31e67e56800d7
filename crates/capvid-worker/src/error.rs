//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Source acquisition failed: {0}")]
    Acquire(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Deployment control failed: {0}")]
    Control(String),

    #[error("Media error: {0}")]
    Media(#[from] capvid_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] capvid_queue::QueueError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn acquire(msg: impl Into<String>) -> Self {
        Self::Acquire(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn control(msg: impl Into<String>) -> Self {
        Self::Control(msg.into())
    }
}
