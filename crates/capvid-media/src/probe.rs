//! Source-media probing.
//!
//! Images are read for their intrinsic dimensions and occupy a fixed
//! configured duration on the canvas; videos are inspected with ffprobe.

use std::path::Path;
use std::process::Stdio;
use serde::Deserialize;
use tokio::process::Command;

use capvid_models::{MediaKind, MediaMetrics, RenderSettings};

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a source media file for width, height and composition duration.
pub async fn probe(
    path: impl AsRef<Path>,
    kind: MediaKind,
    settings: &RenderSettings,
) -> MediaResult<MediaMetrics> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    match kind {
        MediaKind::Image => probe_image(path, settings.image_duration),
        MediaKind::Video => probe_video(path, settings.probe_timeout_secs).await,
    }
}

/// Read intrinsic pixel dimensions without decoding the full image.
fn probe_image(path: &Path, image_duration: f64) -> MediaResult<MediaMetrics> {
    let (width, height) = image::image_dimensions(path)
        .map_err(|e| MediaError::probe_failed(format!("cannot read image dimensions: {}", e), None))?;

    MediaMetrics::new(width, height, image_duration)
        .ok_or_else(|| MediaError::probe_failed("image has zero dimensions", None))
}

/// Inspect the first video stream with ffprobe.
async fn probe_video(path: &Path, timeout_secs: u64) -> MediaResult<MediaMetrics> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let child = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(
        std::time::Duration::from_secs(timeout_secs),
        child.wait_with_output(),
    )
    .await
    .map_err(|_| MediaError::Timeout(timeout_secs))??;

    if !output.status.success() {
        return Err(MediaError::probe_failed(
            "ffprobe exited with non-zero status",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_probe_output(&output.stdout)
}

/// Parse ffprobe's JSON into metrics, rejecting partial results.
fn parse_probe_output(json: &[u8]) -> MediaResult<MediaMetrics> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let stream = probe
        .streams
        .first()
        .ok_or_else(|| MediaError::probe_failed("no video stream found", None))?;

    let width = stream
        .width
        .ok_or_else(|| MediaError::probe_failed("stream has no width", None))?;
    let height = stream
        .height
        .ok_or_else(|| MediaError::probe_failed("stream has no height", None))?;
    let duration = stream
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::probe_failed("stream has no parsable duration", None))?;

    MediaMetrics::new(width, height, duration)
        .ok_or_else(|| MediaError::probe_failed("stream reported non-positive dimensions", None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_probe_output() {
        let json = br#"{"streams":[{"width":1920,"height":1080,"duration":"8.341000"}]}"#;
        let m = parse_probe_output(json).unwrap();
        assert_eq!(m.width, 1920);
        assert_eq!(m.height, 1080);
        assert!((m.duration - 8.341).abs() < 1e-9);
    }

    #[test]
    fn test_parse_rejects_missing_stream() {
        let json = br#"{"streams":[]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::ProbeFailed { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_partial_tuple() {
        // Height present but no duration: never a partial result.
        let json = br#"{"streams":[{"width":1280,"height":720}]}"#;
        assert!(matches!(
            parse_probe_output(json),
            Err(MediaError::ProbeFailed { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_zero_dimensions() {
        let json = br#"{"streams":[{"width":0,"height":720,"duration":"3.0"}]}"#;
        assert!(parse_probe_output(json).is_err());
    }

    #[tokio::test]
    async fn test_probe_missing_file() {
        let settings = RenderSettings::default();
        let err = probe("/nonexistent/file.mp4", MediaKind::Video, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
