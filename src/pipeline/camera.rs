use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded};

use crate::{config::CaptureConfig, error::StreamError, types::Frame};

// How often a blocked acquirer re-checks its cancel token.
const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One opened capture device. Dropping it closes the device.
pub trait CaptureDevice: Send {
    /// Blocks until the next frame. `Ok(None)` means the device ended the
    /// stream cleanly; `Err` is a read failure.
    fn next_frame(&mut self) -> anyhow::Result<Option<Frame>>;
}

/// Knows how to open the physical device behind a [`FrameSource`].
pub trait DeviceOpener: Send + Sync {
    fn open(&self, config: &CaptureConfig) -> anyhow::Result<Box<dyn CaptureDevice>>;

    fn describe(&self) -> String;
}

/// Consumer-side cancellation flag, shared between the stream and whoever
/// may abandon it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Exclusive-access lock for one physical device, held as a single token in
/// a one-slot channel. Whoever holds the token may open the device.
#[derive(Clone, Debug)]
pub struct DeviceLock {
    token_tx: Sender<()>,
    token_rx: Receiver<()>,
}

impl Default for DeviceLock {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceLock {
    pub fn new() -> Self {
        let (token_tx, token_rx) = bounded(1);
        // The channel is empty and we own the receiver, so this cannot fail.
        let _ = token_tx.send(());
        Self { token_tx, token_rx }
    }

    /// Blocks until the lock is free or `cancel` fires.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<DeviceLease, StreamError> {
        loop {
            if cancel.is_cancelled() {
                return Err(StreamError::Cancelled);
            }
            match self.token_rx.recv_timeout(LOCK_POLL_INTERVAL) {
                Ok(()) => {
                    return Ok(DeviceLease {
                        token_tx: self.token_tx.clone(),
                    });
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(StreamError::device_unavailable(anyhow::anyhow!(
                        "device lock was torn down"
                    )));
                }
            }
        }
    }

    pub fn try_acquire(&self) -> Option<DeviceLease> {
        self.token_rx.try_recv().ok().map(|()| DeviceLease {
            token_tx: self.token_tx.clone(),
        })
    }

    pub fn is_held(&self) -> bool {
        self.token_rx.is_empty()
    }
}

/// Proof of exclusive access. Returning the token on drop wakes one waiter.
#[derive(Debug)]
pub struct DeviceLease {
    token_tx: Sender<()>,
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        let _ = self.token_tx.try_send(());
    }
}

/// The physical capture device and its exclusivity lock. Clones share the
/// same lock, so every clone refers to the same device.
#[derive(Clone)]
pub struct FrameSource {
    opener: Arc<dyn DeviceOpener>,
    lock: DeviceLock,
    config: CaptureConfig,
}

impl FrameSource {
    pub fn new(opener: Arc<dyn DeviceOpener>, config: CaptureConfig) -> Self {
        Self {
            opener,
            lock: DeviceLock::new(),
            config,
        }
    }

    /// Waits for exclusive access, then opens the device with the fixed
    /// capture configuration. The lock is released again if opening fails.
    pub fn acquire(&self, cancel: &CancelToken) -> Result<AcquiredSource, StreamError> {
        let lease = self.lock.acquire(cancel)?;
        let device = self
            .opener
            .open(&self.config)
            .map_err(StreamError::DeviceUnavailable)?;

        log::info!(
            "capture device {} acquired at {}x{}",
            self.opener.describe(),
            self.config.width,
            self.config.height
        );

        Ok(AcquiredSource {
            device: Some(device),
            lease: Some(lease),
            mirror: self.config.mirror,
        })
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_held()
    }
}

/// An open device plus the lease that keeps other sessions out.
pub struct AcquiredSource {
    device: Option<Box<dyn CaptureDevice>>,
    lease: Option<DeviceLease>,
    mirror: bool,
}

impl std::fmt::Debug for AcquiredSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcquiredSource")
            .field("open", &self.device.is_some())
            .field("mirror", &self.mirror)
            .finish()
    }
}

impl AcquiredSource {
    pub fn next_frame(&mut self) -> Result<Option<Frame>, StreamError> {
        let Some(device) = self.device.as_mut() else {
            return Ok(None);
        };
        match device.next_frame() {
            Ok(Some(mut frame)) => {
                if self.mirror {
                    frame.mirror();
                }
                Ok(Some(frame))
            }
            Ok(None) => Ok(None),
            Err(err) => Err(StreamError::FrameRead(err)),
        }
    }

    /// Closes the device, then hands the lock to the next waiter.
    pub fn release(mut self) {
        self.close();
    }

    fn close(&mut self) {
        let was_open = self.device.take().is_some();
        self.lease.take();
        if was_open {
            log::info!("capture device released");
        }
    }
}

impl Drop for AcquiredSource {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(feature = "camera-nokhwa")]
pub use native::{NokhwaOpener, available_cameras};

#[cfg(feature = "camera-nokhwa")]
mod native {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicBool, Ordering},
        },
        thread,
        time::Instant,
    };

    use anyhow::{Result, anyhow};
    use crossbeam_channel::{Receiver, bounded};
    use nokhwa::{
        Camera,
        pixel_format::RgbFormat,
        query,
        utils::{
            ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat,
            RequestedFormatType, Resolution,
        },
    };

    use super::{CaptureDevice, DeviceOpener};
    use crate::{config::CaptureConfig, pipeline::rgba_converter, types::Frame};

    const CAPTURE_FPS: u32 = 30;

    // Prefer pixel formats that are widely supported; MJPEG last because
    // decoding it costs the most per frame.
    const PREFERRED_PIXEL_FORMATS: &[FrameFormat] = &[
        FrameFormat::RAWRGB,
        FrameFormat::RAWBGR,
        FrameFormat::YUYV,
        FrameFormat::NV12,
        FrameFormat::GRAY,
        FrameFormat::MJPEG,
    ];

    fn requested_formats(config: &CaptureConfig) -> [RequestedFormat<'static>; 3] {
        let resolution = Resolution::new(config.width, config.height);
        [
            RequestedFormat::with_formats(
                RequestedFormatType::Closest(CameraFormat::new(
                    resolution,
                    FrameFormat::YUYV,
                    CAPTURE_FPS,
                )),
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::with_formats(
                RequestedFormatType::AbsoluteHighestFrameRate,
                PREFERRED_PIXEL_FORMATS,
            ),
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::None),
        ]
    }

    pub fn available_cameras() -> Result<Vec<(u32, String)>> {
        let cameras = query(ApiBackend::Auto)?;
        Ok(cameras
            .into_iter()
            .filter_map(|info| match info.index() {
                CameraIndex::Index(i) => Some((*i, info.human_name())),
                CameraIndex::String(_) => None,
            })
            .collect())
    }

    fn build_camera(config: &CaptureConfig) -> Result<Camera> {
        let index = CameraIndex::Index(config.device_index);
        let mut last_err = None;

        for requested in requested_formats(config) {
            match Camera::new(index.clone(), requested) {
                Ok(mut camera) => match camera.open_stream() {
                    Ok(()) => return Ok(camera),
                    Err(err) => last_err = Some(err.into()),
                },
                Err(err) => last_err = Some(err.into()),
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("failed to open camera with any supported format")))
    }

    /// Opens the system camera through nokhwa.
    #[derive(Clone, Debug, Default)]
    pub struct NokhwaOpener;

    impl DeviceOpener for NokhwaOpener {
        fn open(&self, config: &CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
            Ok(Box::new(NokhwaDevice::start(config.clone())?))
        }

        fn describe(&self) -> String {
            "camera (nokhwa)".to_string()
        }
    }

    type FrameMessage = Result<Frame>;

    /// The nokhwa camera lives on its own thread; frames are handed over one at
    /// a time through a single-slot channel, so the camera is only read as
    /// fast as the stream pulls.
    struct NokhwaDevice {
        frame_rx: Option<Receiver<FrameMessage>>,
        stop: Arc<AtomicBool>,
        handle: Option<thread::JoinHandle<()>>,
    }

    impl NokhwaDevice {
        fn start(config: CaptureConfig) -> Result<Self> {
            let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
            let (frame_tx, frame_rx) = bounded::<FrameMessage>(1);
            let stop = Arc::new(AtomicBool::new(false));
            let stop_flag = stop.clone();

            let handle = thread::spawn(move || {
                let mut camera = match build_camera(&config) {
                    Ok(cam) => {
                        let _ = ready_tx.send(Ok(()));
                        cam
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while !stop_flag.load(Ordering::Relaxed) {
                    let frame_start = Instant::now();
                    let buffer = match camera.frame() {
                        Ok(buffer) => buffer,
                        Err(err) => {
                            let _ = frame_tx.send(Err(anyhow!(
                                "camera frame read failed (after {:?}): {err}",
                                frame_start.elapsed()
                            )));
                            break;
                        }
                    };

                    let converted = match rgba_converter::convert_camera_frame(&buffer) {
                        Ok(rgba) => rgba,
                        Err(err) => {
                            log::warn!("skipping undecodable camera buffer: {err:?}");
                            continue;
                        }
                    };

                    let frame = Frame::new(converted.rgba, converted.width, converted.height);
                    if frame_tx.send(Ok(frame)).is_err() {
                        break;
                    }
                }

                if let Err(err) = camera.stop_stream() {
                    log::warn!("failed to stop camera stream cleanly: {err}");
                }
            });

            match ready_rx.recv() {
                Ok(Ok(())) => Ok(Self {
                    frame_rx: Some(frame_rx),
                    stop,
                    handle: Some(handle),
                }),
                Ok(Err(err)) => {
                    let _ = handle.join();
                    Err(err)
                }
                Err(_) => {
                    let _ = handle.join();
                    Err(anyhow!("camera thread exited before opening the device"))
                }
            }
        }
    }

    impl CaptureDevice for NokhwaDevice {
        fn next_frame(&mut self) -> Result<Option<Frame>> {
            let Some(frame_rx) = self.frame_rx.as_ref() else {
                return Ok(None);
            };
            match frame_rx.recv() {
                Ok(Ok(frame)) => Ok(Some(frame)),
                Ok(Err(err)) => Err(err),
                // Capture thread finished without an error: nothing more to read.
                Err(_) => Ok(None),
            }
        }
    }

    impl Drop for NokhwaDevice {
        fn drop(&mut self) {
            self.stop.store(true, Ordering::SeqCst);
            // Dropping the receiver unblocks a capture thread parked on send.
            self.frame_rx.take();
            if let Some(handle) = self.handle.take() {
                let _ = handle.join();
            }
        }
    }
}
