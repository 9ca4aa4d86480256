use std::path::PathBuf;

use clap::ValueEnum;

use crate::error::StreamError;

/// Landmark model size. Larger models are slower and more accurate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ModelComplexity {
    Low,
    #[default]
    Medium,
    High,
}

impl ModelComplexity {
    pub fn model_filename(self) -> &'static str {
        match self {
            ModelComplexity::Low => "pose_landmark_lite.onnx",
            ModelComplexity::Medium => "pose_estimation_mediapipe_2023mar.onnx",
            ModelComplexity::High => "pose_landmark_heavy.onnx",
        }
    }

    pub fn intra_threads(self) -> usize {
        match self {
            ModelComplexity::Low => 1,
            ModelComplexity::Medium => 2,
            ModelComplexity::High => 4,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CaptureConfig {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    pub mirror: bool,
    /// Replay images from this directory instead of opening a camera.
    pub input_dir: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
            mirror: true,
            input_dir: None,
        }
    }
}

/// Fixed for the lifetime of a session once handed to the landmark source.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub model_complexity: ModelComplexity,
    pub model_path: Option<PathBuf>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
            model_complexity: ModelComplexity::Medium,
            model_path: None,
        }
    }
}

impl DetectorConfig {
    pub fn model_path(&self) -> PathBuf {
        self.model_path.clone().unwrap_or_else(|| {
            PathBuf::from("models").join(self.model_complexity.model_filename())
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatorConfig {
    pub jpeg_quality: u8,
    pub font_path: Option<PathBuf>,
    pub line_thickness: i32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            font_path: None,
            line_thickness: 2,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamConfig {
    pub capture: CaptureConfig,
    pub detector: DetectorConfig,
    pub annotator: AnnotatorConfig,
    pub max_frames: Option<u64>,
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), StreamError> {
        let confidences = [
            (
                "min detection confidence",
                self.detector.min_detection_confidence,
            ),
            (
                "min tracking confidence",
                self.detector.min_tracking_confidence,
            ),
        ];
        for (name, value) in confidences {
            if !(0.0..=1.0).contains(&value) {
                return Err(StreamError::invalid_config(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if !(1..=100).contains(&self.annotator.jpeg_quality) {
            return Err(StreamError::invalid_config(format!(
                "jpeg quality must be within 1..=100, got {}",
                self.annotator.jpeg_quality
            )));
        }

        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(StreamError::invalid_config(format!(
                "capture resolution must be non-zero, got {}x{}",
                self.capture.width, self.capture.height
            )));
        }

        if self.annotator.line_thickness < 1 {
            return Err(StreamError::invalid_config(
                "line thickness must be at least 1",
            ));
        }

        Ok(())
    }
}
