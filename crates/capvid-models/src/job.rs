//! Queued job payload.

use serde::{Deserialize, Serialize};

/// Kind of source media attached to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Whether the source carries an audio track to pass through.
    pub fn has_audio(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

/// One request to produce a captioned composited video.
///
/// Field names match the queue wire payload. The job id namespaces every
/// temporary file the pipeline creates, so sequential jobs never collide
/// even if a previous cleanup was incomplete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique job ID
    pub job_id: String,
    /// Target chat/recipient ID for delivery
    pub chat_id: i64,
    /// Opaque source-media reference, resolved by the source collaborator
    pub file_id: String,
    /// Kind of the source media
    pub media_type: MediaKind,
    /// Caption text; may contain embedded line breaks
    pub caption_text: String,
    /// Whether the media and caption layers fade in
    #[serde(default)]
    pub apply_fade: bool,
    /// Upstream message IDs the downstream consumer retires after delivery
    #[serde(default)]
    pub messages_to_delete: Vec<i64>,
}

impl Job {
    pub fn new(
        job_id: impl Into<String>,
        chat_id: i64,
        file_id: impl Into<String>,
        media_type: MediaKind,
        caption_text: impl Into<String>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            chat_id,
            file_id: file_id.into(),
            media_type,
            caption_text: caption_text.into(),
            apply_fade: false,
            messages_to_delete: Vec::new(),
        }
    }

    /// Enable the fade-in treatment.
    pub fn with_fade(mut self, apply_fade: bool) -> Self {
        self.apply_fade = apply_fade;
        self
    }

    /// Set the upstream message IDs to retire.
    pub fn with_messages_to_delete(mut self, ids: Vec<i64>) -> Self {
        self.messages_to_delete = ids;
        self
    }
}
