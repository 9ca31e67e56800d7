//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

fn fmt_stderr(stderr: &Option<String>) -> String {
    match stderr {
        Some(s) if !s.is_empty() => format!(": {}", s.trim_end()),
        _ => String::new(),
    }
}

/// Errors that can occur while probing, rendering or encoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Caption font not found: {0}")]
    FontMissing(PathBuf),

    #[error("Probe failed: {message}{}", fmt_stderr(stderr))]
    ProbeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Caption rendering failed: {0}")]
    RenderFailed(String),

    #[error("Encode failed: {message}{}", fmt_stderr(stderr))]
    EncodeFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Frame extraction failed: {message}{}", fmt_stderr(stderr))]
    ExtractFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a probe failure error.
    pub fn probe_failed(message: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
            stderr,
        }
    }

    /// Create a render failure error.
    pub fn render_failed(message: impl Into<String>) -> Self {
        Self::RenderFailed(message.into())
    }

    /// Create an encode failure error.
    pub fn encode_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::EncodeFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a frame-extraction failure error.
    pub fn extract_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ExtractFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
