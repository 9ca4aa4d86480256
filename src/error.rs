use thiserror::Error;

/// Failures surfaced by a streaming session.
///
/// Only `DeviceUnavailable`, `FrameRead` and `Landmark` end a session. `Encoding`
/// drops the current frame and the session carries on.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("capture device unavailable")]
    DeviceUnavailable(#[source] anyhow::Error),

    #[error("frame read failed mid-stream")]
    FrameRead(#[source] anyhow::Error),

    #[error("failed to encode annotated frame")]
    Encoding(#[source] anyhow::Error),

    #[error("landmark source could not be started")]
    Landmark(#[source] anyhow::Error),

    #[error("stream cancelled by consumer")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("pose `{0}` is already registered")]
    DuplicatePose(String),
}

impl StreamError {
    pub fn device_unavailable(err: impl Into<anyhow::Error>) -> Self {
        Self::DeviceUnavailable(err.into())
    }

    pub fn frame_read(err: impl Into<anyhow::Error>) -> Self {
        Self::FrameRead(err.into())
    }

    pub fn encoding(err: impl Into<anyhow::Error>) -> Self {
        Self::Encoding(err.into())
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Whether this error ends the session it occurred in.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Encoding(_))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::*;

    #[test]
    fn encoding_is_the_only_recoverable_failure() {
        assert!(!StreamError::encoding(anyhow!("bad buffer")).is_terminal());
        assert!(StreamError::frame_read(anyhow!("usb unplugged")).is_terminal());
        assert!(StreamError::device_unavailable(anyhow!("busy")).is_terminal());
        assert!(StreamError::Cancelled.is_terminal());
    }

    #[test]
    fn source_chain_is_kept() {
        let err = StreamError::device_unavailable(anyhow!("no /dev/video0"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no /dev/video0"));
    }

    #[test]
    fn alternate_format_carries_the_cause_chain() {
        let cause = anyhow!("EBUSY").context("open /dev/video0");
        let err = anyhow::Error::from(StreamError::device_unavailable(cause));
        assert_eq!(
            format!("{err:#}"),
            "capture device unavailable: open /dev/video0: EBUSY"
        );
    }

    #[test]
    fn duplicate_pose_message() {
        let err = StreamError::DuplicatePose("Tadasana".into());
        assert!(err.to_string().contains("Tadasana"));
    }
}
