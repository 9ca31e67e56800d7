//! Caption rasterization.
//!
//! Turns a caption string into a transparent RGBA PNG: wrapped, centered,
//! stroked, with a soft Gaussian-blurred drop shadow underneath. Rendering
//! is deterministic for identical inputs.

use std::path::{Path, PathBuf};

use fontdue::{Font, FontSettings};
use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

use capvid_models::RenderSettings;

use crate::error::{MediaError, MediaResult};
use crate::wrap::wrap_text;

/// A loaded caption font.
///
/// The font file is a static asset; its absence is a worker-fatal
/// configuration error, so the worker loads it once at startup.
#[derive(Debug)]
pub struct CaptionFont {
    font: Font,
}

impl CaptionFont {
    /// Load a TTF font from disk.
    pub fn load(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FontMissing(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| MediaError::render_failed(format!("invalid font file: {}", e)))?;
        Ok(Self { font })
    }
}

/// Rendered caption image plus its measured text-block height.
///
/// The height is currently unused downstream but stays part of the
/// contract for composition refinements.
#[derive(Debug, Clone)]
pub struct CaptionArtifact {
    pub path: PathBuf,
    pub text_height: u32,
}

/// Measured layout of the wrapped text block.
struct BlockLayout {
    lines: Vec<String>,
    line_widths: Vec<f32>,
    /// Natural line height (ascent minus descent)
    line_height: f32,
    /// Extra configured spacing between lines
    spacing: f32,
    ascent: f32,
    width: u32,
    height: u32,
}

/// Render the caption for one job into `out_dir`.
pub fn render(
    text: &str,
    job_id: &str,
    out_dir: impl AsRef<Path>,
    font: &CaptionFont,
    settings: &RenderSettings,
) -> MediaResult<CaptionArtifact> {
    let lines = padded_lines(text, settings);
    let layout = measure_block(&font.font, lines, settings)?;

    let padding = settings.caption_padding();
    let img_width = (layout.width + padding).max(1);
    let img_height = (layout.height + padding).max(1);

    // Shadow pass: displaced, wide stroke in the shadow color, then a
    // Gaussian blur over the whole canvas so the shadow edge is diffuse.
    let mut canvas = RgbaImage::new(img_width, img_height);
    let shadow_origin = (
        padding as f32 / 2.0 + settings.shadow_offset.0 as f32,
        padding as f32 / 2.0 + settings.shadow_offset.1 as f32,
    );
    draw_block(
        &mut canvas,
        &font.font,
        &layout,
        shadow_origin,
        settings.shadow_color,
        settings.shadow_color,
        settings.draw_stroke,
        settings.font_size,
    );
    let mut canvas = imageops::blur(&canvas, settings.shadow_blur_radius as f32);

    // Foreground pass: undisplaced, black stroke under the text color.
    let text_origin = (padding as f32 / 2.0, padding as f32 / 2.0);
    draw_block(
        &mut canvas,
        &font.font,
        &layout,
        text_origin,
        settings.text_color,
        [0, 0, 0],
        settings.draw_stroke,
        settings.font_size,
    );

    let path = out_dir.as_ref().join(format!("caption_{}.png", job_id));
    canvas
        .save(&path)
        .map_err(|e| MediaError::render_failed(format!("cannot save caption image: {}", e)))?;

    debug!(job_id, path = %path.display(), "rendered caption image");

    Ok(CaptionArtifact {
        path,
        text_height: layout.height,
    })
}

/// Prepend the configured blank leading lines and wrap to the column width.
fn padded_lines(text: &str, settings: &RenderSettings) -> Vec<String> {
    let padded = format!("{}{}", "\n".repeat(settings.leading_blank_lines), text);
    wrap_text(&padded, settings.wrap_columns)
}

/// Measure the multi-line block: per-line advance widths, line height from
/// the font's horizontal metrics, and the bounding box including the
/// measurement stroke margin so stroked glyphs are not clipped.
fn measure_block(
    font: &Font,
    lines: Vec<String>,
    settings: &RenderSettings,
) -> MediaResult<BlockLayout> {
    let px = settings.font_size;
    let metrics = font
        .horizontal_line_metrics(px)
        .ok_or_else(|| MediaError::render_failed("font has no horizontal metrics"))?;

    let line_height = metrics.ascent - metrics.descent;
    let line_widths: Vec<f32> = lines.iter().map(|l| line_width(font, l, px)).collect();
    let max_width = line_widths.iter().cloned().fold(0.0f32, f32::max);

    let n = lines.len() as u32;
    let stroke_margin = settings.measure_stroke * 2;
    let width = max_width.ceil() as u32 + stroke_margin;
    let height =
        (line_height.ceil() as u32) * n + settings.line_spacing * n.saturating_sub(1) + stroke_margin;

    Ok(BlockLayout {
        lines,
        line_widths,
        line_height,
        spacing: settings.line_spacing as f32,
        ascent: metrics.ascent,
        width,
        height,
    })
}

fn line_width(font: &Font, line: &str, px: f32) -> f32 {
    line.chars()
        .map(|c| font.metrics(c, px).advance_width)
        .sum()
}

/// Draw the block with its lines centered on the block width: one stroke
/// pass stamping every glyph at all integer offsets within the stroke
/// radius, then the fill pass on top.
#[allow(clippy::too_many_arguments)]
fn draw_block(
    canvas: &mut RgbaImage,
    font: &Font,
    layout: &BlockLayout,
    origin: (f32, f32),
    fill: [u8; 3],
    stroke_color: [u8; 3],
    stroke: u32,
    px: f32,
) {
    let s = stroke as i32;
    for dy in -s..=s {
        for dx in -s..=s {
            if dx * dx + dy * dy > s * s || (dx == 0 && dy == 0) {
                continue;
            }
            draw_lines(canvas, font, layout, origin, stroke_color, px, (dx, dy));
        }
    }
    draw_lines(canvas, font, layout, origin, fill, px, (0, 0));
}

fn draw_lines(
    canvas: &mut RgbaImage,
    font: &Font,
    layout: &BlockLayout,
    origin: (f32, f32),
    color: [u8; 3],
    px: f32,
    offset: (i32, i32),
) {
    for (i, line) in layout.lines.iter().enumerate() {
        let line_x = origin.0 + (layout.width as f32 - layout.line_widths[i]) / 2.0;
        let baseline =
            origin.1 + layout.ascent + i as f32 * (layout.line_height + layout.spacing);
        draw_line(canvas, font, line, line_x, baseline, color, px, offset);
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_line(
    canvas: &mut RgbaImage,
    font: &Font,
    line: &str,
    start_x: f32,
    baseline_y: f32,
    color: [u8; 3],
    px: f32,
    offset: (i32, i32),
) {
    let mut pen_x = start_x;
    for c in line.chars() {
        let (metrics, coverage) = font.rasterize(c, px);
        let glyph_x = pen_x.round() as i32 + metrics.xmin + offset.0;
        let glyph_y =
            baseline_y.round() as i32 - (metrics.height as i32 + metrics.ymin) + offset.1;

        for row in 0..metrics.height {
            for col in 0..metrics.width {
                let alpha = coverage[row * metrics.width + col];
                if alpha == 0 {
                    continue;
                }
                let x = glyph_x + col as i32;
                let y = glyph_y + row as i32;
                if x < 0 || y < 0 || x >= canvas.width() as i32 || y >= canvas.height() as i32 {
                    continue;
                }
                blend_pixel(canvas, x as u32, y as u32, color, alpha);
            }
        }
        pen_x += metrics.advance_width;
    }
}

/// Standard source-over blend of an opaque `color` with coverage `alpha`.
fn blend_pixel(canvas: &mut RgbaImage, x: u32, y: u32, color: [u8; 3], alpha: u8) {
    let dst = canvas.get_pixel_mut(x, y);
    let sa = alpha as u32;
    let da = dst[3] as u32;
    let out_a = sa + da * (255 - sa) / 255;
    if out_a == 0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mut out = [0u8; 4];
    for i in 0..3 {
        let sc = color[i] as u32;
        let dc = dst[i] as u32;
        out[i] = ((sc * sa + dc * da * (255 - sa) / 255) / out_a) as u8;
    }
    out[3] = out_a as u8;
    *dst = Rgba(out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture_font() -> CaptionFont {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/DejaVuSansMono.ttf"
        );
        CaptionFont::load(path).unwrap()
    }

    #[test]
    fn test_render_is_deterministic() {
        let font = fixture_font();
        let settings = RenderSettings::default();
        let dir = TempDir::new().unwrap();

        let first = render("Hello, world!", "det-a", dir.path(), &font, &settings).unwrap();
        let second = render("Hello, world!", "det-b", dir.path(), &font, &settings).unwrap();

        assert!(first.text_height > 0);
        let a = std::fs::read(&first.path).unwrap();
        let b = std::fs::read(&second.path).unwrap();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_pads_measured_block_by_blur_margin() {
        let font = fixture_font();
        let settings = RenderSettings::default();
        let dir = TempDir::new().unwrap();

        let artifact = render("pad check", "pad-1", dir.path(), &font, &settings).unwrap();
        let (w, h) = image::image_dimensions(&artifact.path).unwrap();

        // The canvas is the measured block plus the blur padding on all
        // sides, so the blurred shadow is never clipped.
        assert_eq!(h, artifact.text_height + settings.caption_padding());
        assert!(w > settings.caption_padding());
    }

    #[test]
    fn test_render_empty_text_is_not_an_error() {
        let font = fixture_font();
        let settings = RenderSettings::default();
        let dir = TempDir::new().unwrap();

        let artifact = render("", "empty-1", dir.path(), &font, &settings).unwrap();
        let (w, h) = image::image_dimensions(&artifact.path).unwrap();
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn test_load_missing_font_file() {
        let err = CaptionFont::load("/nonexistent/font.ttf").unwrap_err();
        assert!(matches!(err, MediaError::FontMissing(_)));
    }

    #[test]
    fn test_padded_lines_prepends_blank_lines() {
        let settings = RenderSettings {
            leading_blank_lines: 2,
            ..Default::default()
        };
        let lines = padded_lines("Hello", &settings);
        assert_eq!(lines, vec!["", "", "Hello"]);
    }

    #[test]
    fn test_padded_lines_empty_text() {
        let settings = RenderSettings::default();
        assert_eq!(padded_lines("", &settings), vec![""]);
    }

    #[test]
    fn test_blend_pixel_opaque_over_transparent() {
        let mut img = RgbaImage::new(1, 1);
        blend_pixel(&mut img, 0, 0, [255, 255, 255], 255);
        assert_eq!(img.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_blend_pixel_partial_coverage() {
        let mut img = RgbaImage::new(1, 1);
        blend_pixel(&mut img, 0, 0, [255, 255, 255], 128);
        let p = img.get_pixel(0, 0);
        assert_eq!(p[3], 128);
        assert_eq!(p[0], 255);
    }
}
