use std::convert::TryFrom;

use anyhow::{Result, anyhow};
use nokhwa::{Buffer, utils::FrameFormat};
use rayon::prelude::*;
use yuv::{
    YuvBiPlanarImage, YuvConversionMode, YuvPackedImage, YuvRange, YuvStandardMatrix,
    yuv_nv12_to_rgba, yuyv422_to_rgba,
};
use zune_jpeg::{
    JpegDecoder,
    zune_core::{bytestream::ZCursor, colorspace::ColorSpace, options::DecoderOptions},
};

#[derive(Debug)]
pub struct RgbaImage {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Converts whatever pixel format the camera negotiated into packed RGBA.
pub fn convert_camera_frame(frame: &Buffer) -> Result<RgbaImage> {
    let resolution = frame.resolution();
    let (width, height) = (resolution.width_x, resolution.height_y);
    let data = frame.buffer();
    let pixels = width as usize * height as usize;

    let rgba = match frame.source_frame_format() {
        FrameFormat::NV12 => {
            expect_len("NV12", data, pixels + pixels / 2)?;
            nv12_to_rgba(data, width, height)?
        }
        FrameFormat::YUYV => {
            expect_len("YUYV", data, pixels * 2)?;
            yuyv_to_rgba(data, width, height)?
        }
        FrameFormat::MJPEG => mjpeg_to_rgba(data, pixels)?,
        FrameFormat::RAWRGB => {
            expect_len("RGB", data, pixels * 3)?;
            packed_rgb_to_rgba(data, pixels, false)
        }
        FrameFormat::RAWBGR => {
            expect_len("BGR", data, pixels * 3)?;
            packed_rgb_to_rgba(data, pixels, true)
        }
        FrameFormat::GRAY => {
            expect_len("GRAY", data, pixels)?;
            gray_to_rgba(data, pixels)
        }
    };

    Ok(RgbaImage {
        rgba,
        width,
        height,
    })
}

fn expect_len(format: &str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(anyhow!(
            "{format} buffer too small: got {}, expected {expected}",
            data.len()
        ));
    }
    Ok(())
}

fn nv12_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let y_len = width as usize * height as usize;
    let image = YuvBiPlanarImage {
        y_plane: &data[..y_len],
        y_stride: width,
        uv_plane: &data[y_len..y_len + y_len / 2],
        uv_stride: width,
        width,
        height,
    };

    let mut rgba = vec![0u8; y_len * 4];
    yuv_nv12_to_rgba(
        &image,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
        YuvConversionMode::Balanced,
    )
    .map_err(|err| anyhow!("NV12 to RGBA failed: {err:?}"))?;
    Ok(rgba)
}

fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let packed = YuvPackedImage {
        yuy: data,
        yuy_stride: width * 2,
        width,
        height,
    };

    let mut rgba = vec![0u8; width as usize * height as usize * 4];
    yuyv422_to_rgba(
        &packed,
        &mut rgba,
        width * 4,
        YuvRange::Full,
        YuvStandardMatrix::Bt709,
    )
    .map_err(|err| anyhow!("YUYV422 to RGBA failed: {err:?}"))?;
    Ok(rgba)
}

fn mjpeg_to_rgba(data: &[u8], pixels: usize) -> Result<Vec<u8>> {
    let options = DecoderOptions::default().jpeg_set_out_colorspace(ColorSpace::RGBA);
    let mut decoder = JpegDecoder::new_with_options(ZCursor::new(data), options);
    let rgba = decoder
        .decode()
        .map_err(|err| anyhow!("MJPEG decode failed: {err:?}"))?;

    let decoded_pixels = match decoder.info() {
        Some(info) => usize::try_from(info.width)
            .and_then(|w| usize::try_from(info.height).map(|h| w * h))
            .map_err(|_| anyhow!("MJPEG dimensions do not fit usize"))?,
        None => pixels,
    };
    if decoded_pixels != pixels || rgba.len() < pixels * 4 {
        return Err(anyhow!(
            "MJPEG frame is {decoded_pixels} pixels ({} bytes), camera reported {pixels}",
            rgba.len()
        ));
    }
    Ok(rgba)
}

fn packed_rgb_to_rgba(data: &[u8], pixels: usize, swap_rb: bool) -> Vec<u8> {
    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data.par_chunks_exact(3))
        .for_each(|(dst, src)| {
            let (r, b) = if swap_rb {
                (src[2], src[0])
            } else {
                (src[0], src[2])
            };
            dst.copy_from_slice(&[r, src[1], b, 255]);
        });
    rgba
}

fn gray_to_rgba(data: &[u8], pixels: usize) -> Vec<u8> {
    let mut rgba = vec![0u8; pixels * 4];
    rgba.par_chunks_mut(4)
        .zip(data[..pixels].par_iter().copied())
        .for_each(|(dst, value)| dst.copy_from_slice(&[value, value, value, 255]));
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bgr_is_swapped_into_rgba() {
        let rgba = packed_rgb_to_rgba(&[1, 2, 3, 4, 5, 6], 2, true);
        assert_eq!(rgba, vec![3, 2, 1, 255, 6, 5, 4, 255]);
        let rgba = packed_rgb_to_rgba(&[1, 2, 3], 1, false);
        assert_eq!(rgba, vec![1, 2, 3, 255]);
    }

    #[test]
    fn gray_is_replicated_across_channels() {
        assert_eq!(gray_to_rgba(&[7, 9], 2), vec![7, 7, 7, 255, 9, 9, 9, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(expect_len("YUYV", &[0; 7], 8).is_err());
        assert!(expect_len("YUYV", &[0; 8], 8).is_ok());
    }
}
