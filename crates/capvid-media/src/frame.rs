//! Representative still-frame extraction.

use std::path::{Path, PathBuf};
use tracing::info;

use capvid_models::RenderSettings;

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Midpoint of the trimmed duration: what a viewer actually sees, not the
/// pre-trim timeline.
pub fn midpoint(composition_duration: f64, settings: &RenderSettings) -> f64 {
    settings.trimmed_duration(composition_duration) / 2.0
}

/// Extract one frame from the finished clip at the trimmed midpoint.
pub async fn extract(
    clip_path: impl AsRef<Path>,
    composition_duration: f64,
    job_id: &str,
    out_dir: impl AsRef<Path>,
    settings: &RenderSettings,
) -> MediaResult<PathBuf> {
    let frame_path = out_dir.as_ref().join(format!("frame_{}.jpg", job_id));
    let seek = midpoint(composition_duration, settings);

    let cmd = FfmpegCommand::new(&frame_path)
        .input(FfmpegInput::file(clip_path.as_ref()))
        .output_seek(seek)
        .single_frame();

    let output = FfmpegRunner::new()
        .with_timeout(settings.extract_timeout_secs)
        .capture(&cmd)
        .await?;

    if !output.status.success() {
        return Err(MediaError::extract_failed(
            "ffmpeg exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
            output.status.code(),
        ));
    }

    info!(job_id, path = %frame_path.display(), "extracted preview frame");
    Ok(frame_path)
}
