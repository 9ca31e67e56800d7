//! Render settings.
//!
//! One immutable structure, constructed at process start and threaded
//! explicitly into the caption renderer and the composition engine.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default encoding preset (low latency over compression efficiency)
pub const DEFAULT_PRESET: &str = "superfast";
/// Default encoder tune
pub const DEFAULT_TUNE: &str = "zerolatency";
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Default pixel format
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Fixed parameters of the composition template and caption rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    /// Canvas width in pixels (portrait)
    pub canvas_width: u32,
    /// Canvas height in pixels (portrait)
    pub canvas_height: u32,
    /// Background fill color (ffmpeg color name)
    pub background_color: String,
    /// Output frame rate
    pub fps: u32,
    /// On-canvas duration for image sources, seconds
    pub image_duration: f64,
    /// Fade-in window for the media layer, seconds
    pub media_fade: f64,
    /// Fade-in window for the caption layer, seconds
    pub caption_fade: f64,
    /// Fixed vertical offset added to the centered media placement
    pub media_y_offset: i32,
    /// Warm-up discard cut from the start of the encoded output, seconds
    pub start_trim: f64,

    /// Caption font file path (TTF)
    pub font_path: String,
    /// Caption font size in pixels
    pub font_size: f32,
    /// Word-wrap column width in characters
    pub wrap_columns: usize,
    /// Blank lines prepended before the caption text
    pub leading_blank_lines: usize,
    /// Extra spacing between lines, pixels
    pub line_spacing: u32,
    /// Foreground text color (RGB)
    pub text_color: [u8; 3],
    /// Shadow color (RGB)
    pub shadow_color: [u8; 3],
    /// Shadow displacement (x, y) in pixels
    pub shadow_offset: (i32, i32),
    /// Gaussian blur radius of the shadow, pixels
    pub shadow_blur_radius: u32,
    /// Stroke width used when measuring the text block
    pub measure_stroke: u32,
    /// Stroke width used when drawing the text
    pub draw_stroke: u32,

    /// Video codec
    pub video_codec: String,
    /// Encoder preset
    pub preset: String,
    /// Encoder tune
    pub tune: String,
    /// Audio codec
    pub audio_codec: String,
    /// Audio bitrate
    pub audio_bitrate: String,
    /// Pixel format
    pub pixel_format: String,

    /// ffprobe timeout, seconds
    pub probe_timeout_secs: u64,
    /// Encode timeout, seconds
    pub encode_timeout_secs: u64,
    /// Frame-extraction timeout, seconds
    pub extract_timeout_secs: u64,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas_width: 1080,
            canvas_height: 1920,
            background_color: "black".to_string(),
            fps: 30,
            image_duration: 12.0,
            media_fade: 10.0,
            caption_fade: 4.0,
            media_y_offset: 0,
            start_trim: 0.4,

            font_path: "ZalandoSans-Medium.ttf".to_string(),
            font_size: 40.0,
            wrap_columns: 35,
            leading_blank_lines: 0,
            line_spacing: 5,
            text_color: [255, 255, 255],
            shadow_color: [0, 0, 0],
            shadow_offset: (0, 0),
            shadow_blur_radius: 20,
            measure_stroke: 1,
            draw_stroke: 2,

            video_codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            tune: DEFAULT_TUNE.to_string(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),

            probe_timeout_secs: 30,
            encode_timeout_secs: 300,
            extract_timeout_secs: 30,
        }
    }
}

impl RenderSettings {
    /// Canvas size as an ffmpeg `WxH` string.
    pub fn canvas_size(&self) -> String {
        format!("{}x{}", self.canvas_width, self.canvas_height)
    }

    /// Padding added on all sides of the caption canvas so the blurred
    /// shadow is never clipped at the image edge.
    pub fn caption_padding(&self) -> u32 {
        self.shadow_blur_radius * 4
    }

    /// What a viewer actually sees: composition duration minus the trim.
    pub fn trimmed_duration(&self, composition_duration: f64) -> f64 {
        (composition_duration - self.start_trim).max(0.0)
    }
}
