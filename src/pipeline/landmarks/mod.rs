#[cfg(feature = "landmarks-ort")]
mod common;
#[cfg(feature = "landmarks-ort")]
mod ort;

#[cfg(feature = "landmarks-ort")]
pub use self::ort::OrtPoseFactory;

use crate::{
    config::DetectorConfig,
    types::{Frame, LandmarkSet},
};

/// Per-frame body landmark extraction. Implementations may keep tracking
/// state between frames, so one instance belongs to exactly one session.
pub trait LandmarkSource: Send {
    /// `Ok(None)` when no body was found in the frame.
    fn detect(&mut self, frame: &Frame) -> anyhow::Result<Option<LandmarkSet>>;
}

/// Builds a fresh [`LandmarkSource`] for every session.
pub trait LandmarkSourceFactory: Send + Sync {
    fn create(&self, config: &DetectorConfig) -> anyhow::Result<Box<dyn LandmarkSource>>;

    fn label(&self) -> &'static str;
}
