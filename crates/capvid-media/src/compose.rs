//! Composition engine.
//!
//! `plan` resolves every encode parameter for one job from the job, the
//! probed metrics and the fixed settings; `execute` issues the single
//! ffmpeg invocation that composites background, media and caption.

use std::path::{Path, PathBuf};
use tracing::{error, info};

use capvid_models::{Job, MediaMetrics, RenderSettings};

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::graph::{FilterChain, FilterGraph, FilterOp, OverlayPos};

/// Fully resolved encode parameters for one job.
///
/// A pure function of Job + MediaMetrics + RenderSettings; recomputed per
/// job, no independent lifecycle.
#[derive(Debug, Clone)]
pub struct CompositionPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub background_color: String,
    /// Composition duration (before the start trim)
    pub duration: f64,
    /// Media height after scaling to the canvas width
    pub scaled_media_height: u32,
    /// Vertical placement of the scaled media
    pub media_y: i64,
    /// Media layer fade-in window, if fading
    pub media_fade: Option<f64>,
    /// Caption layer fade-in window, if fading
    pub caption_fade: Option<f64>,
    /// Loop the media input (image sources)
    pub loop_media: bool,
    /// Carry the source audio track through
    pub has_audio: bool,
    pub start_trim: f64,
    pub fps: u32,
    pub video_codec: String,
    pub preset: String,
    pub tune: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub pixel_format: String,
    pub encode_timeout_secs: u64,
}

/// Derive the composition plan.
pub fn plan(job: &Job, metrics: MediaMetrics, settings: &RenderSettings) -> CompositionPlan {
    let scale_ratio = settings.canvas_width as f64 / metrics.width as f64;
    let scaled_media_height = (metrics.height as f64 * scale_ratio).round() as u32;
    let media_y = (settings.canvas_height as i64 - scaled_media_height as i64) / 2
        + settings.media_y_offset as i64;

    CompositionPlan {
        canvas_width: settings.canvas_width,
        canvas_height: settings.canvas_height,
        background_color: settings.background_color.clone(),
        duration: metrics.duration,
        scaled_media_height,
        media_y,
        media_fade: job.apply_fade.then_some(settings.media_fade),
        caption_fade: job.apply_fade.then_some(settings.caption_fade),
        loop_media: !job.media_type.has_audio(),
        has_audio: job.media_type.has_audio(),
        start_trim: settings.start_trim,
        fps: settings.fps,
        video_codec: settings.video_codec.clone(),
        preset: settings.preset.clone(),
        tune: settings.tune.clone(),
        audio_codec: settings.audio_codec.clone(),
        audio_bitrate: settings.audio_bitrate.clone(),
        pixel_format: settings.pixel_format.clone(),
        encode_timeout_secs: settings.encode_timeout_secs,
    }
}

/// Build the filter graph for a plan.
///
/// Input indices: 0 = background color source, 1 = media, 2 = caption.
pub fn filter_graph(plan: &CompositionPlan) -> FilterGraph {
    let mut graph = FilterGraph::new();

    let mut media_ops = vec![
        FilterOp::Scale {
            width: plan.canvas_width as i64,
            height: -1,
        },
        FilterOp::SetPtsStart,
    ];
    if let Some(d) = plan.media_fade {
        media_ops.push(FilterOp::FadeIn { duration: d });
    }
    graph.push(FilterChain::new(["1:v"], media_ops, "scaled_media"));

    let mut caption_ops = vec![
        FilterOp::FormatRgba,
        FilterOp::Trim {
            duration: plan.duration,
        },
    ];
    if let Some(d) = plan.caption_fade {
        caption_ops.push(FilterOp::FadeIn { duration: d });
    }
    graph.push(FilterChain::new(["2:v"], caption_ops, "faded_caption"));

    graph.push(FilterChain::new(
        ["0:v", "scaled_media"],
        vec![FilterOp::Overlay {
            x: OverlayPos::Centered,
            y: OverlayPos::Pixels(plan.media_y),
        }],
        "base_scene",
    ));
    graph.push(FilterChain::new(
        ["base_scene", "faded_caption"],
        vec![FilterOp::Overlay {
            x: OverlayPos::Centered,
            y: OverlayPos::Centered,
        }],
        "final_v",
    ));

    if plan.has_audio {
        graph.push(FilterChain::new(
            ["1:a"],
            vec![FilterOp::AudioSetPtsStart],
            "final_a",
        ));
    }

    graph
}

/// Assemble the full ffmpeg command for a plan.
pub fn build_command(
    plan: &CompositionPlan,
    media_path: &Path,
    caption_path: &Path,
    output_path: &Path,
) -> FfmpegCommand {
    let background = FfmpegInput::lavfi(format!(
        "color=c={}:s={}x{}:d={}",
        plan.background_color, plan.canvas_width, plan.canvas_height, plan.duration
    ));
    let media = if plan.loop_media {
        FfmpegInput::file(media_path).looped(Some(plan.duration))
    } else {
        FfmpegInput::file(media_path)
    };
    let caption = FfmpegInput::file(caption_path).looped(None);

    let mut cmd = FfmpegCommand::new(output_path)
        .input(background)
        .input(media)
        .input(caption)
        .filter_complex(filter_graph(plan).render())
        .map("final_v");

    if plan.has_audio {
        cmd = cmd.map("final_a");
    }

    cmd.output_seek(plan.start_trim)
        .video_codec(&plan.video_codec)
        .preset(&plan.preset)
        .tune(&plan.tune)
        .audio_codec(&plan.audio_codec)
        .audio_bitrate(&plan.audio_bitrate)
        .frame_rate(plan.fps)
        .pixel_format(&plan.pixel_format)
}

/// Run the encode, producing `output_{job_id}.mp4` in `out_dir`.
///
/// A non-zero encoder exit aborts the job with no retry; encoder failures
/// are deterministic for the same inputs.
pub async fn execute(
    plan: &CompositionPlan,
    media_path: &Path,
    caption_path: &Path,
    out_dir: &Path,
    job_id: &str,
) -> MediaResult<PathBuf> {
    let output_path = out_dir.join(format!("output_{}.mp4", job_id));
    let cmd = build_command(plan, media_path, caption_path, &output_path);

    let output = FfmpegRunner::new()
        .with_timeout(plan.encode_timeout_secs)
        .capture(&cmd)
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        error!(job_id, "ffmpeg encode failed: {}", stderr);
        return Err(MediaError::encode_failed(
            "ffmpeg exited with non-zero status",
            Some(stderr),
            output.status.code(),
        ));
    }

    info!(job_id, path = %output_path.display(), "composition encoded");
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capvid_models::MediaKind;

    fn test_job(kind: MediaKind, fade: bool) -> Job {
        Job::new("j1", 42, "file-ref", kind, "caption").with_fade(fade)
    }

    #[test]
    fn test_plan_scales_width_to_canvas() {
        let settings = RenderSettings::default();
        // Any source width: scaled width is exactly the canvas width, so
        // only the height is stored.
        for (w, h) in [(1920u32, 1080u32), (640, 480), (1080, 1920), (333, 777)] {
            let metrics = MediaMetrics::new(w, h, 8.0).unwrap();
            let p = plan(&test_job(MediaKind::Video, false), metrics, &settings);
            let expected_h =
                (h as f64 * settings.canvas_width as f64 / w as f64).round() as u32;
            assert_eq!(p.scaled_media_height, expected_h);
            // Aspect preserved within rounding
            let ratio_src = w as f64 / h as f64;
            let ratio_scaled = settings.canvas_width as f64 / p.scaled_media_height as f64;
            assert!((ratio_src - ratio_scaled).abs() < 0.01);
        }
    }

    #[test]
    fn test_plan_centers_media_vertically() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1080, 1080, 5.0).unwrap();
        let p = plan(&test_job(MediaKind::Image, false), metrics, &settings);
        assert_eq!(p.scaled_media_height, 1080);
        assert_eq!(p.media_y, (1920 - 1080) / 2);
    }

    #[test]
    fn test_plan_fades_follow_flag() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1280, 720, 6.0).unwrap();

        let with_fade = plan(&test_job(MediaKind::Video, true), metrics, &settings);
        assert_eq!(with_fade.media_fade, Some(10.0));
        assert_eq!(with_fade.caption_fade, Some(4.0));

        let without = plan(&test_job(MediaKind::Video, false), metrics, &settings);
        assert!(without.media_fade.is_none());
        assert!(without.caption_fade.is_none());
    }

    #[test]
    fn test_plan_audio_and_loop_by_kind() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1280, 720, 6.0).unwrap();

        let video = plan(&test_job(MediaKind::Video, false), metrics, &settings);
        assert!(video.has_audio);
        assert!(!video.loop_media);

        let image = plan(&test_job(MediaKind::Image, false), metrics, &settings);
        assert!(!image.has_audio);
        assert!(image.loop_media);
        assert!((image.duration - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_graph_structure_with_fade_and_audio() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1280, 720, 6.0).unwrap();
        let p = plan(&test_job(MediaKind::Video, true), metrics, &settings);
        let graph = filter_graph(&p);

        let media = graph.chain_for("scaled_media").unwrap();
        assert!(media.ops.contains(&FilterOp::FadeIn { duration: 10.0 }));

        let caption = graph.chain_for("faded_caption").unwrap();
        assert!(caption.ops.contains(&FilterOp::Trim { duration: 6.0 }));
        assert!(caption.ops.contains(&FilterOp::FadeIn { duration: 4.0 }));

        assert!(graph.chain_for("final_v").is_some());
        assert!(graph.chain_for("final_a").is_some());
    }

    #[test]
    fn test_graph_no_fade_no_audio() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(800, 600, 12.0).unwrap();
        let p = plan(&test_job(MediaKind::Image, false), metrics, &settings);
        let graph = filter_graph(&p);

        let media = graph.chain_for("scaled_media").unwrap();
        assert!(!media
            .ops
            .iter()
            .any(|op| matches!(op, FilterOp::FadeIn { .. })));
        assert!(graph.chain_for("final_a").is_none());
    }

    #[test]
    fn test_graph_render_matches_template() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1080, 1080, 5.0).unwrap();
        let p = plan(&test_job(MediaKind::Image, true), metrics, &settings);

        let rendered = filter_graph(&p).render();
        assert_eq!(
            rendered,
            "[1:v]scale=1080:-1,setpts=PTS-STARTPTS,fade=t=in:st=0:d=10[scaled_media];\
             [2:v]format=rgba,trim=duration=5,fade=t=in:st=0:d=4[faded_caption];\
             [0:v][scaled_media]overlay=(W-w)/2:420[base_scene];\
             [base_scene][faded_caption]overlay=(W-w)/2:(H-h)/2[final_v]"
        );
    }

    #[test]
    fn test_command_assembly() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1280, 720, 6.0).unwrap();
        let p = plan(&test_job(MediaKind::Video, false), metrics, &settings);

        let cmd = build_command(
            &p,
            Path::new("dl/j1.mp4"),
            Path::new("out/caption_j1.png"),
            Path::new("out/output_j1.mp4"),
        );
        let args = cmd.build_args();
        let joined = args.join(" ");

        assert!(joined.contains("-f lavfi -i color=c=black:s=1080x1920:d=6"));
        assert!(joined.contains("-map [final_v]"));
        assert!(joined.contains("-map [final_a]"));
        assert!(joined.contains("-ss 0.4"));
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-preset superfast"));
        assert!(joined.contains("-tune zerolatency"));
        assert!(joined.contains("-b:a 192k"));
        assert!(joined.contains("-r 30"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        // Video source: no -loop on the media input
        assert!(!joined.contains("-loop 1 -i dl/j1.mp4"));
    }

    #[test]
    fn test_command_loops_image_media() {
        let settings = RenderSettings::default();
        let metrics = MediaMetrics::new(1280, 720, 12.0).unwrap();
        let p = plan(&test_job(MediaKind::Image, false), metrics, &settings);

        let cmd = build_command(
            &p,
            Path::new("dl/j1.jpg"),
            Path::new("out/caption_j1.png"),
            Path::new("out/output_j1.mp4"),
        );
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-loop 1 -t 12 -i dl/j1.jpg"));
        assert!(!joined.contains("-map [final_a]"));
    }
}
