use std::sync::Arc;

use super::{
    annotator::FrameAnnotator,
    camera::{AcquiredSource, CancelToken, FrameSource},
    landmarks::{LandmarkSource, LandmarkSourceFactory},
    mjpeg,
};
use crate::{config::DetectorConfig, error::StreamError, pose::PoseRegistry};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Acquiring,
    Streaming,
    Draining,
    Closed,
}

/// Wires a frame source, a landmark backend, the pose registry and the
/// annotator together. Cloning is cheap and clones share the same device.
#[derive(Clone)]
pub struct StreamOrchestrator {
    frame_source: FrameSource,
    landmarks: Arc<dyn LandmarkSourceFactory>,
    registry: Arc<PoseRegistry>,
    annotator: Arc<FrameAnnotator>,
    detector_config: DetectorConfig,
    max_frames: Option<u64>,
}

impl StreamOrchestrator {
    pub fn new(
        frame_source: FrameSource,
        landmarks: Arc<dyn LandmarkSourceFactory>,
        registry: Arc<PoseRegistry>,
        annotator: Arc<FrameAnnotator>,
        detector_config: DetectorConfig,
    ) -> Self {
        Self {
            frame_source,
            landmarks,
            registry,
            annotator,
            detector_config,
            max_frames: None,
        }
    }

    /// Stop each session after this many emitted chunks.
    pub fn with_max_frames(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn frame_source(&self) -> &FrameSource {
        &self.frame_source
    }

    pub fn open_stream(&self) -> MjpegStream {
        self.open_stream_with(CancelToken::new())
    }

    /// Starts a new session in `Idle`. Nothing is acquired until the first
    /// call to `next`.
    pub fn open_stream_with(&self, cancel: CancelToken) -> MjpegStream {
        MjpegStream {
            state: SessionState::Idle,
            cancel,
            orchestrator: self.clone(),
            session: None,
            emitted: 0,
        }
    }
}

struct ActiveSession {
    detector: Box<dyn LandmarkSource>,
    source: AcquiredSource,
}

enum Pump {
    Chunk(Vec<u8>),
    Skipped,
    Finished,
    Failed(StreamError),
}

/// One streaming session, pulled chunk by chunk. Each item is a complete
/// multipart part. Dropping the stream cancels it and releases the device.
pub struct MjpegStream {
    state: SessionState,
    cancel: CancelToken,
    orchestrator: StreamOrchestrator,
    session: Option<ActiveSession>,
    emitted: u64,
}

impl MjpegStream {
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn frames_emitted(&self) -> u64 {
        self.emitted
    }

    fn start_session(&self) -> Result<ActiveSession, StreamError> {
        let source = self.orchestrator.frame_source.acquire(&self.cancel)?;
        let factory = &self.orchestrator.landmarks;
        let detector = match factory.create(&self.orchestrator.detector_config) {
            Ok(detector) => detector,
            Err(err) => {
                source.release();
                return Err(StreamError::Landmark(err));
            }
        };
        log::info!("session streaming with {} landmark backend", factory.label());
        Ok(ActiveSession { detector, source })
    }

    fn pump(&mut self) -> Pump {
        if self.cancel.is_cancelled() {
            log::info!("stream cancelled by consumer");
            return Pump::Finished;
        }
        if let Some(limit) = self.orchestrator.max_frames {
            if self.emitted >= limit {
                log::info!("frame limit of {limit} reached");
                return Pump::Finished;
            }
        }
        let Some(session) = self.session.as_mut() else {
            return Pump::Finished;
        };

        let frame = match session.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("capture device reached end of stream");
                return Pump::Finished;
            }
            Err(err) => {
                log::error!("session failed: {err}");
                return Pump::Failed(err);
            }
        };

        let landmarks = match session.detector.detect(&frame) {
            Ok(landmarks) => landmarks,
            Err(err) => {
                log::warn!("landmark inference failed, treating frame as undetected: {err:#}");
                None
            }
        };
        let result = self.orchestrator.registry.classify(landmarks.as_ref());
        log::trace!("frame classified as {:?}", result.names());

        match self
            .orchestrator
            .annotator
            .render(frame, landmarks.as_ref(), &result)
        {
            Ok(jpeg) => {
                self.emitted += 1;
                Pump::Chunk(mjpeg::encode_part(&jpeg))
            }
            Err(err) if err.is_terminal() => Pump::Failed(err),
            Err(err) => {
                log::warn!("dropping frame: {:#}", anyhow::Error::from(err));
                Pump::Skipped
            }
        }
    }

    /// Releases the landmark source and then the device. Idempotent.
    fn drain(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Draining;
        if let Some(ActiveSession { detector, source }) = self.session.take() {
            drop(detector);
            source.release();
            log::info!("session closed after {} frames", self.emitted);
        }
        self.state = SessionState::Closed;
    }
}

impl Iterator for MjpegStream {
    type Item = Result<Vec<u8>, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                SessionState::Idle => self.state = SessionState::Acquiring,
                SessionState::Acquiring => match self.start_session() {
                    Ok(session) => {
                        self.session = Some(session);
                        self.state = SessionState::Streaming;
                    }
                    Err(StreamError::Cancelled) => {
                        log::info!("stream cancelled while waiting for the device");
                        self.state = SessionState::Closed;
                        return None;
                    }
                    Err(err) => {
                        log::error!("session failed: {err}");
                        self.state = SessionState::Closed;
                        return Some(Err(err));
                    }
                },
                SessionState::Streaming => match self.pump() {
                    Pump::Chunk(chunk) => return Some(Ok(chunk)),
                    Pump::Skipped => continue,
                    Pump::Finished => {
                        self.drain();
                        return None;
                    }
                    Pump::Failed(err) => {
                        self.drain();
                        return Some(Err(err));
                    }
                },
                SessionState::Draining => self.drain(),
                SessionState::Closed => return None,
            }
        }
    }
}

impl Drop for MjpegStream {
    fn drop(&mut self) {
        self.drain();
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;
    use crate::{
        config::{AnnotatorConfig, CaptureConfig},
        pipeline::camera::{CaptureDevice, DeviceOpener},
        types::{Frame, LandmarkSet},
    };

    struct Frames(u32);

    impl CaptureDevice for Frames {
        fn next_frame(&mut self) -> anyhow::Result<Option<Frame>> {
            if self.0 == 0 {
                return Ok(None);
            }
            self.0 -= 1;
            Ok(Some(Frame::new(vec![90; 32 * 24 * 4], 32, 24)))
        }
    }

    struct Opener(u32);

    impl DeviceOpener for Opener {
        fn open(&self, _config: &CaptureConfig) -> anyhow::Result<Box<dyn CaptureDevice>> {
            Ok(Box::new(Frames(self.0)))
        }

        fn describe(&self) -> String {
            "test frames".into()
        }
    }

    struct Blind;

    impl LandmarkSource for Blind {
        fn detect(&mut self, _frame: &Frame) -> anyhow::Result<Option<LandmarkSet>> {
            Err(anyhow!("model crashed"))
        }
    }

    struct BlindFactory {
        fail: bool,
    }

    impl LandmarkSourceFactory for BlindFactory {
        fn create(&self, _config: &DetectorConfig) -> anyhow::Result<Box<dyn LandmarkSource>> {
            if self.fail {
                return Err(anyhow!("model missing"));
            }
            Ok(Box::new(Blind))
        }

        fn label(&self) -> &'static str {
            "blind"
        }
    }

    fn orchestrator(frames: u32, fail_factory: bool) -> StreamOrchestrator {
        StreamOrchestrator::new(
            FrameSource::new(Arc::new(Opener(frames)), CaptureConfig::default()),
            Arc::new(BlindFactory { fail: fail_factory }),
            Arc::new(PoseRegistry::builtin()),
            Arc::new(FrameAnnotator::new(&AnnotatorConfig::default()).unwrap()),
            DetectorConfig::default(),
        )
    }

    #[test]
    fn walks_the_state_machine() {
        let orchestrator = orchestrator(2, false);
        let mut stream = orchestrator.open_stream();
        assert_eq!(stream.state(), SessionState::Idle);
        assert!(!orchestrator.frame_source().is_locked());

        assert!(stream.next().unwrap().is_ok());
        assert_eq!(stream.state(), SessionState::Streaming);
        assert!(orchestrator.frame_source().is_locked());

        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().is_none());
        assert_eq!(stream.state(), SessionState::Closed);
        assert_eq!(stream.frames_emitted(), 2);
        assert!(!orchestrator.frame_source().is_locked());
        assert!(stream.next().is_none());
    }

    #[test]
    fn inference_failure_is_treated_as_no_detection() {
        let orchestrator = orchestrator(1, false);
        let chunks: Vec<_> = orchestrator.open_stream().collect();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_ok());
    }

    #[test]
    fn landmark_startup_failure_releases_the_device() {
        let orchestrator = orchestrator(3, true);
        let mut stream = orchestrator.open_stream();
        assert!(matches!(stream.next(), Some(Err(StreamError::Landmark(_)))));
        assert!(stream.next().is_none());
        assert_eq!(stream.state(), SessionState::Closed);
        assert!(!orchestrator.frame_source().is_locked());
    }

    #[test]
    fn frame_limit_ends_the_session() {
        let orchestrator = orchestrator(10, false).with_max_frames(Some(3));
        let mut stream = orchestrator.open_stream();
        assert_eq!(stream.by_ref().count(), 3);
        assert_eq!(stream.state(), SessionState::Closed);
        assert!(!orchestrator.frame_source().is_locked());
    }

    #[test]
    fn cancel_token_stops_before_the_next_frame() {
        let orchestrator = orchestrator(10, false);
        let mut stream = orchestrator.open_stream();
        assert!(stream.next().is_some());
        stream.cancel_token().cancel();
        assert!(stream.next().is_none());
        assert!(!orchestrator.frame_source().is_locked());
    }
}
