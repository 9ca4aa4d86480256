use std::{
    path::{Path, PathBuf},
    vec,
};

use anyhow::{Context, Result, bail};

use super::camera::{CaptureDevice, DeviceOpener};
use crate::{config::CaptureConfig, types::Frame};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Replays still images from a directory as if they came from a camera.
#[derive(Clone, Debug)]
pub struct ImageSequenceOpener {
    dir: PathBuf,
}

impl ImageSequenceOpener {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DeviceOpener for ImageSequenceOpener {
    fn open(&self, _config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
        let images = list_images(&self.dir)?;
        if images.is_empty() {
            bail!("no png/jpg images in {}", self.dir.display());
        }
        log::info!(
            "replaying {} images from {}",
            images.len(),
            self.dir.display()
        );
        Ok(Box::new(ImageSequence {
            images: images.into_iter(),
        }))
    }

    fn describe(&self) -> String {
        format!("image sequence {}", self.dir.display())
    }
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read image directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|v| ext.eq_ignore_ascii_case(v)));
        if is_image {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

struct ImageSequence {
    images: vec::IntoIter<PathBuf>,
}

impl CaptureDevice for ImageSequence {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.images.next() else {
            return Ok(None);
        };
        let image = image::open(&path)
            .with_context(|| format!("failed to open image {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Some(Frame::new(image.into_raw(), width, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("yoga-pose-stream-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn replays_images_in_name_order_then_ends() {
        let dir = scratch_dir("replay");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(dir.join("b.png"))
            .unwrap();
        image::RgbaImage::from_pixel(6, 3, image::Rgba([1, 2, 3, 255]))
            .save(dir.join("a.png"))
            .unwrap();
        std::fs::write(dir.join("notes.txt"), b"ignored").unwrap();

        let mut device = ImageSequenceOpener::new(&dir)
            .open(&CaptureConfig::default())
            .unwrap();
        let first = device.next_frame().unwrap().unwrap();
        assert_eq!((first.width, first.height), (6, 3));
        let second = device.next_frame().unwrap().unwrap();
        assert_eq!((second.width, second.height), (4, 2));
        assert_eq!(&second.rgba[..4], &[10, 20, 30, 255]);
        assert!(device.next_frame().unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_directory_cannot_be_opened() {
        let dir = scratch_dir("empty");
        assert!(ImageSequenceOpener::new(&dir)
            .open(&CaptureConfig::default())
            .is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
