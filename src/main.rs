use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use yoga_pose_stream::{
    StreamConfig,
    config::{AnnotatorConfig, CaptureConfig, DetectorConfig, ModelComplexity},
    pipeline::{
        CONTENT_TYPE, DeviceOpener, FrameAnnotator, FrameSource, ImageSequenceOpener,
        LandmarkSourceFactory, StreamOrchestrator,
    },
    pose::PoseRegistry,
};

/// Classify yoga poses from a live camera and emit an annotated MJPEG stream.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Camera index to open
    #[arg(short, long, default_value_t = 0)]
    device: u32,

    #[arg(long, default_value_t = 640)]
    width: u32,

    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Do not mirror frames horizontally
    #[arg(long)]
    no_mirror: bool,

    /// Replay png/jpg images from this directory instead of a camera
    #[arg(long)]
    input_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 0.5)]
    min_detection_confidence: f32,

    #[arg(long, default_value_t = 0.5)]
    min_tracking_confidence: f32,

    #[arg(long, value_enum, default_value_t = ModelComplexity::Medium)]
    model_complexity: ModelComplexity,

    /// Pose landmark ONNX model (defaults to models/<file for complexity>)
    #[arg(long)]
    model: Option<PathBuf>,

    #[arg(long, default_value_t = 80)]
    jpeg_quality: u8,

    /// TTF/OTF font for the pose label, replacing the bundled DejaVu Sans
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    line_thickness: i32,

    /// Write the multipart stream here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Stop after this many frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// List cameras and exit
    #[arg(long)]
    list_cameras: bool,
}

impl Cli {
    fn stream_config(&self) -> StreamConfig {
        StreamConfig {
            capture: CaptureConfig {
                device_index: self.device,
                width: self.width,
                height: self.height,
                mirror: !self.no_mirror,
                input_dir: self.input_dir.clone(),
            },
            detector: DetectorConfig {
                min_detection_confidence: self.min_detection_confidence,
                min_tracking_confidence: self.min_tracking_confidence,
                model_complexity: self.model_complexity,
                model_path: self.model.clone(),
            },
            annotator: AnnotatorConfig {
                jpeg_quality: self.jpeg_quality,
                font_path: self.font.clone(),
                line_thickness: self.line_thickness,
            },
            max_frames: self.max_frames,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.list_cameras {
        return list_cameras();
    }

    let config = cli.stream_config();
    config.validate()?;

    let frame_source = FrameSource::new(device_opener(&config.capture)?, config.capture.clone());
    let annotator = FrameAnnotator::new(&config.annotator)?;
    let orchestrator = StreamOrchestrator::new(
        frame_source,
        landmark_backend()?,
        Arc::new(PoseRegistry::builtin()),
        Arc::new(annotator),
        config.detector.clone(),
    )
    .with_max_frames(config.max_frames);

    let sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create output {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut sink = BufWriter::new(sink);
    log::info!("streaming as {CONTENT_TYPE}");

    for chunk in orchestrator.open_stream() {
        let chunk = chunk?;
        let written = sink.write_all(&chunk).and_then(|()| sink.flush());
        match written {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                log::info!("consumer went away, stopping stream");
                break;
            }
            Err(err) => return Err(err).context("failed to write stream chunk"),
        }
    }

    Ok(())
}

fn device_opener(capture: &CaptureConfig) -> Result<Arc<dyn DeviceOpener>> {
    if let Some(dir) = &capture.input_dir {
        return Ok(Arc::new(ImageSequenceOpener::new(dir)));
    }
    camera_opener()
}

#[cfg(feature = "camera-nokhwa")]
fn camera_opener() -> Result<Arc<dyn DeviceOpener>> {
    Ok(Arc::new(yoga_pose_stream::pipeline::NokhwaOpener))
}

#[cfg(not(feature = "camera-nokhwa"))]
fn camera_opener() -> Result<Arc<dyn DeviceOpener>> {
    anyhow::bail!("built without camera support; pass --input-dir to replay images")
}

#[cfg(feature = "landmarks-ort")]
fn landmark_backend() -> Result<Arc<dyn LandmarkSourceFactory>> {
    Ok(Arc::new(yoga_pose_stream::pipeline::landmarks::OrtPoseFactory))
}

#[cfg(not(feature = "landmarks-ort"))]
fn landmark_backend() -> Result<Arc<dyn LandmarkSourceFactory>> {
    anyhow::bail!("built without a landmark backend; enable the `landmarks-ort` feature")
}

#[cfg(feature = "camera-nokhwa")]
fn list_cameras() -> Result<()> {
    let cameras = yoga_pose_stream::pipeline::available_cameras()?;
    if cameras.is_empty() {
        anyhow::bail!("no cameras found");
    }
    for (index, name) in cameras {
        println!("{index}: {name}");
    }
    Ok(())
}

#[cfg(not(feature = "camera-nokhwa"))]
fn list_cameras() -> Result<()> {
    anyhow::bail!("built without camera support")
}
