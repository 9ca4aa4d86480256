//! Classify still images without a camera:
//! `cargo run --example classify_images -- photo1.jpg photo2.png`

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use yoga_pose_stream::{
    config::DetectorConfig,
    pipeline::{LandmarkSource, LandmarkSourceFactory, landmarks::OrtPoseFactory},
    pose::PoseRegistry,
    types::Frame,
};

fn main() -> Result<()> {
    env_logger::init();

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("usage: classify_images <image>...");
    }

    let config = DetectorConfig::default();
    let mut detector = OrtPoseFactory.create(&config)?;
    let registry = PoseRegistry::builtin();

    for path in paths {
        let image = image::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let frame = Frame::new(image.into_raw(), width, height);

        let landmarks = detector.detect(&frame)?;
        let result = registry.classify(landmarks.as_ref());
        println!("{}: {}", path.display(), result.label());
    }

    Ok(())
}
