use anyhow::{Context, Result, anyhow};
use fast_image_resize as fir;
use ndarray::Array4;
use rayon::prelude::*;

use crate::types::{Frame, LANDMARK_COUNT, LandmarkSet, Point3};

pub const INPUT_SIZE: u32 = 256;
/// The model emits 39 points (33 body joints + 6 auxiliary) of 5 values each.
pub const MODEL_POINTS: usize = 39;
pub const VALUES_PER_POINT: usize = 5;

#[derive(Clone, Debug)]
pub struct LetterboxInfo {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: u32,
    pub orig_h: u32,
}

/// Resizes the frame into a square, zero-padded RGB tensor in `[0, 1]`.
pub fn prepare_frame(frame: &Frame, target_size: u32) -> Result<(Array4<f32>, LetterboxInfo)> {
    let expected_len = (frame.width as usize)
        .saturating_mul(frame.height as usize)
        .saturating_mul(4);
    if frame.rgba.len() != expected_len || expected_len == 0 {
        return Err(anyhow!(
            "frame buffer size mismatch: got {}, expected {}",
            frame.rgba.len(),
            expected_len
        ));
    }

    let scale = target_size as f32 / (frame.width.max(frame.height) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;

    let src_image = fir::images::Image::from_vec_u8(
        frame.width,
        frame.height,
        frame.rgba.clone(),
        fir::PixelType::U8x4,
    )?;
    let mut dst_image = fir::images::Image::new(new_w, new_h, fir::PixelType::U8x4);
    let resize_options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Interpolation(fir::FilterType::Bilinear));
    fir::Resizer::new()
        .resize(&src_image, &mut dst_image, Some(&resize_options))
        .context("fast resize failed")?;
    let resized = dst_image.into_vec();

    let pad_x = ((target_size - new_w) / 2) as usize;
    let pad_y = ((target_size - new_h) / 2) as usize;
    let mut canvas = vec![0u8; (target_size as usize) * (target_size as usize) * 4];
    let dst_stride = target_size as usize * 4;
    let src_stride = new_w as usize * 4;
    for row in 0..(new_h as usize) {
        let dst_offset = (pad_y + row) * dst_stride + pad_x * 4;
        let src_offset = row * src_stride;
        canvas[dst_offset..dst_offset + src_stride]
            .copy_from_slice(&resized[src_offset..src_offset + src_stride]);
    }

    let normalized: Vec<f32> = canvas
        .par_chunks_exact(4)
        .flat_map_iter(|px| {
            [
                px[0] as f32 / 255.0,
                px[1] as f32 / 255.0,
                px[2] as f32 / 255.0,
            ]
        })
        .collect();
    let input = Array4::<f32>::from_shape_vec(
        (1, target_size as usize, target_size as usize, 3),
        normalized,
    )
    .map_err(|err| anyhow!("failed to build input tensor: {err}"))?;

    Ok((
        input,
        LetterboxInfo {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
            orig_w: frame.width,
            orig_h: frame.height,
        },
    ))
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Maps raw model output (input-tensor pixels) back to coordinates
/// normalized against the original frame.
pub fn decode_landmarks(flat: &[f32], letterbox: &LetterboxInfo) -> Result<LandmarkSet> {
    if flat.len() < MODEL_POINTS * VALUES_PER_POINT {
        return Err(anyhow!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            MODEL_POINTS * VALUES_PER_POINT
        ));
    }

    let (w, h) = (letterbox.orig_w as f32, letterbox.orig_h as f32);
    let points: Vec<Point3> = flat
        .chunks_exact(VALUES_PER_POINT)
        .take(LANDMARK_COUNT)
        .map(|v| {
            let x = (v[0] - letterbox.pad_x) / letterbox.scale;
            let y = (v[1] - letterbox.pad_y) / letterbox.scale;
            let z = v[2] / letterbox.scale;
            Point3::new(x / w, y / h, z / w, sigmoid(v[3]))
        })
        .collect();

    LandmarkSet::from_slice(&points).ok_or_else(|| anyhow!("model returned fewer than 33 points"))
}
