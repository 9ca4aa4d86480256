use std::path::Path;

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont, point};
use anyhow::{Context, anyhow};
use image::{ExtendedColorType, codecs::jpeg::JpegEncoder};

use super::skeleton;
use crate::{
    config::AnnotatorConfig,
    error::StreamError,
    types::{ClassificationResult, Frame, LandmarkSet},
};

pub const DETECTED_COLOR: [u8; 3] = [0, 255, 0];
pub const UNDETECTED_COLOR: [u8; 3] = [255, 0, 0];

const BANNER_HEIGHT: u32 = 44;
const STATUS_STRIP_HEIGHT: u32 = 4;
const BACKDROP_ALPHA: f32 = 0.55;
const TEXT_ORIGIN: (f32, f32) = (10.0, 30.0);
const TEXT_SCALE: f32 = 24.0;

/// DejaVu Sans, used unless a font file is configured.
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Draws the skeleton and the classification label onto frames and encodes
/// them as JPEG.
pub struct FrameAnnotator {
    font: FontArc,
    jpeg_quality: u8,
    line_thickness: i32,
}

impl std::fmt::Debug for FrameAnnotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameAnnotator")
            .field("jpeg_quality", &self.jpeg_quality)
            .field("line_thickness", &self.line_thickness)
            .finish_non_exhaustive()
    }
}

impl FrameAnnotator {
    /// Uses the bundled font unless `font_path` is set, in which case that
    /// file must load.
    pub fn new(config: &AnnotatorConfig) -> Result<Self, StreamError> {
        let font = match &config.font_path {
            Some(path) => load_font(path)
                .map(FontArc::new)
                .map_err(|err| StreamError::invalid_config(format!("{err:#}")))?,
            None => FontArc::try_from_slice(BUNDLED_FONT)
                .map_err(|err| StreamError::invalid_config(format!("bundled font: {err}")))?,
        };
        Ok(Self {
            font,
            jpeg_quality: config.jpeg_quality,
            line_thickness: config.line_thickness,
        })
    }

    /// Annotates and encodes one frame.
    pub fn render(
        &self,
        mut frame: Frame,
        landmarks: Option<&LandmarkSet>,
        result: &ClassificationResult,
    ) -> Result<Vec<u8>, StreamError> {
        check_buffer(&frame)?;
        self.annotate(&mut frame, landmarks, result);
        self.encode_jpeg(&frame)
    }

    pub fn annotate(
        &self,
        frame: &mut Frame,
        landmarks: Option<&LandmarkSet>,
        result: &ClassificationResult,
    ) {
        let (width, height) = (frame.width, frame.height);
        if let Some(landmarks) = landmarks {
            skeleton::draw_skeleton(
                &mut frame.rgba,
                width,
                height,
                landmarks,
                self.line_thickness,
            );
        }

        let color = if result.is_empty() {
            UNDETECTED_COLOR
        } else {
            DETECTED_COLOR
        };
        draw_banner(&mut frame.rgba, width, height, color);
        draw_text(
            &mut frame.rgba,
            width,
            height,
            &self.font,
            &result.label(),
            color,
        );
    }

    pub fn encode_jpeg(&self, frame: &Frame) -> Result<Vec<u8>, StreamError> {
        check_buffer(frame)?;
        let rgb: Vec<u8> = frame
            .rgba
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect();

        let mut jpeg = Vec::with_capacity(rgb.len() / 8);
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(StreamError::encoding)?;
        Ok(jpeg)
    }
}

fn check_buffer(frame: &Frame) -> Result<(), StreamError> {
    let expected = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if expected == 0 || frame.rgba.len() != expected {
        return Err(StreamError::encoding(anyhow!(
            "frame buffer size mismatch: got {}, expected {} for {}x{}",
            frame.rgba.len(),
            expected,
            frame.width,
            frame.height
        )));
    }
    Ok(())
}

fn load_font(path: &Path) -> anyhow::Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read font {}", path.display()))?;
    FontVec::try_from_vec(bytes).map_err(|err| anyhow!("invalid font {}: {err}", path.display()))
}

/// Darkens the top band of the frame and underlines it in `color`.
fn draw_banner(buffer: &mut [u8], width: u32, height: u32, color: [u8; 3]) {
    let band = BANNER_HEIGHT.min(height);
    let strip_start = band.saturating_sub(STATUS_STRIP_HEIGHT);
    for y in 0..band {
        for x in 0..width {
            let idx = ((y * width + x) as usize) * 4;
            let Some(px) = buffer.get_mut(idx..idx + 4) else {
                return;
            };
            if y >= strip_start {
                px[..3].copy_from_slice(&color);
            } else {
                for c in px.iter_mut().take(3) {
                    *c = (*c as f32 * (1.0 - BACKDROP_ALPHA)) as u8;
                }
            }
            px[3] = 255;
        }
    }
}

fn draw_text(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    font: &FontArc,
    text: &str,
    color: [u8; 3],
) {
    let scaled = font.as_scaled(PxScale::from(TEXT_SCALE));
    let (origin_x, baseline) = TEXT_ORIGIN;
    let mut caret = point(origin_x, baseline);
    let mut previous = None;

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret.x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scaled.scale(), caret);
        caret.x += scaled.h_advance(id);
        previous = Some(id);

        let Some(outlined) = scaled.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let x = bounds.min.x as i32 + gx as i32;
            let y = bounds.min.y as i32 + gy as i32;
            blend_pixel(buffer, width, height, x, y, color, coverage);
        });
    }
}

fn blend_pixel(
    buffer: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 3],
    coverage: f32,
) {
    if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
        return;
    }
    let idx = ((y as u32 * width + x as u32) as usize) * 4;
    let Some(px) = buffer.get_mut(idx..idx + 3) else {
        return;
    };
    let alpha = coverage.clamp(0.0, 1.0);
    for (dst, src) in px.iter_mut().zip(color) {
        *dst = (*dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    }
}
