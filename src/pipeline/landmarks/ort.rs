use std::path::Path;

use anyhow::{Context, Result, anyhow};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::Tensor,
};

use super::{
    LandmarkSource, LandmarkSourceFactory,
    common::{self, INPUT_SIZE},
};
use crate::{
    config::DetectorConfig,
    model_download::ensure_pose_model_ready,
    types::{Frame, LandmarkSet},
};

/// Loads the MediaPipe pose landmark model through ONNX Runtime.
#[derive(Clone, Debug, Default)]
pub struct OrtPoseFactory;

impl LandmarkSourceFactory for OrtPoseFactory {
    fn create(&self, config: &DetectorConfig) -> Result<Box<dyn LandmarkSource>> {
        let model_path = config.model_path();
        ensure_pose_model_ready(&model_path, config.model_complexity, |_evt| {})
            .with_context(|| format!("failed to prepare pose model at {}", model_path.display()))?;

        let engine = OrtPoseEngine::new(&model_path, config)?;
        log::info!(
            "pose landmark backend ready using {} ({:?} complexity)",
            model_path.display(),
            config.model_complexity
        );
        Ok(Box::new(engine))
    }

    fn label(&self) -> &'static str {
        "ort"
    }
}

struct OrtPoseEngine {
    session: Session,
    min_detection_confidence: f32,
    min_tracking_confidence: f32,
    tracking: bool,
}

impl OrtPoseEngine {
    fn new(model_path: &Path, config: &DetectorConfig) -> Result<Self> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.model_complexity.intra_threads())?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load ORT session from {}", model_path.display()))?;

        Ok(Self {
            session,
            min_detection_confidence: config.min_detection_confidence,
            min_tracking_confidence: config.min_tracking_confidence,
            tracking: false,
        })
    }

    /// A body already being followed only has to clear the tracking bar.
    fn presence_threshold(&self) -> f32 {
        if self.tracking {
            self.min_tracking_confidence
        } else {
            self.min_detection_confidence
        }
    }
}

impl LandmarkSource for OrtPoseEngine {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>> {
        let threshold = self.presence_threshold();
        let (input, letterbox) = common::prepare_frame(frame, INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .context("failed to run pose landmark session")?;

        if outputs.len() < 2 {
            return Err(anyhow!(
                "pose model returned {} outputs, expected at least 2",
                outputs.len()
            ));
        }

        let presence = outputs[1]
            .try_extract_array::<f32>()?
            .iter()
            .next()
            .copied()
            .unwrap_or(0.0);
        if presence < threshold {
            self.tracking = false;
            return Ok(None);
        }

        let coords = outputs[0].try_extract_array::<f32>()?;
        let flattened: Vec<f32> = coords.iter().copied().collect();
        let landmarks = common::decode_landmarks(&flattened, &letterbox)?;
        self.tracking = true;
        Ok(Some(landmarks))
    }
}
