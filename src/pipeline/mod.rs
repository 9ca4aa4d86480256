pub mod annotator;
pub mod camera;
pub mod image_sequence;
pub mod landmarks;
pub mod mjpeg;
#[cfg(feature = "camera-nokhwa")]
pub mod rgba_converter;
pub mod session;
pub mod skeleton;

// Re-exports for convenience
pub use annotator::FrameAnnotator;
pub use camera::{
    AcquiredSource, CancelToken, CaptureDevice, DeviceLease, DeviceLock, DeviceOpener,
    FrameSource,
};
#[cfg(feature = "camera-nokhwa")]
pub use camera::{NokhwaOpener, available_cameras};
pub use image_sequence::ImageSequenceOpener;
pub use landmarks::{LandmarkSource, LandmarkSourceFactory};
pub use mjpeg::{CONTENT_TYPE, MjpegPart, encode_part, parse_part};
pub use session::{MjpegStream, SessionState, StreamOrchestrator};
