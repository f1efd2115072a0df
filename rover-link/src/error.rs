//! Error types for the rover link.

use rover_messages::{ErrorKind, PayloadError};
use thiserror::Error;

/// Everything that can go wrong while handling a message.
///
/// Whether an error ends the control loop is decided by [`LinkError::is_fatal`] at the message
/// envelope, handlers only propagate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// A frame declared more payload bytes than `MAX_FRAME_LEN`.
    #[error("frame declares {declared} bytes, more than the maximum")]
    FrameTooLong { declared: u8 },

    /// The trailing length of a frame exceeds the leading one.
    #[error("frame length {actual} exceeds declared length {declared}")]
    LengthMismatch { declared: u8, actual: u8 },

    /// A start or stop marker was expected but something else arrived.
    #[error("expected byte {expected:#04x}, received {found:#04x}")]
    UnexpectedByte { expected: u8, found: u8 },

    /// A scan request still had its continuation flag set after the last allowed frame.
    #[error("scan request spans more than the allowed number of frames")]
    TooManyFrames,

    #[error("unknown message type {0}")]
    BadMessageType(u8),

    #[error("unknown subsystem {0}")]
    BadSubsystem(u8),

    #[error("unknown command {command} for subsystem {subsystem}")]
    BadCommand { subsystem: u8, command: u8 },

    /// A single frame request arrived with more frames following.
    #[error("request should fit in a single data frame")]
    UnexpectedContinuation,

    #[error("bad request payload: {0}")]
    BadPayload(PayloadError),

    #[error("bad request: {0}")]
    BadRequest(&'static str),

    /// The transport reached end of stream.
    #[error("connection closed")]
    Disconnected,

    #[error("transport error: {0:?}")]
    Transport(embedded_io::ErrorKind),
}

impl LinkError {
    /// Classification handed to the error reporter.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LinkError::FrameTooLong { .. } => ErrorKind::FrameTooLong,
            LinkError::LengthMismatch { .. } => ErrorKind::LengthMismatch,
            LinkError::UnexpectedByte { .. } => ErrorKind::UnexpectedByte,
            LinkError::TooManyFrames => ErrorKind::TooManyFrames,
            LinkError::BadMessageType(_) => ErrorKind::BadMessageType,
            LinkError::UnexpectedContinuation => ErrorKind::BadFraming,
            LinkError::BadSubsystem(_)
            | LinkError::BadCommand { .. }
            | LinkError::BadPayload(_)
            | LinkError::BadRequest(_) => ErrorKind::BadRequest,
            LinkError::Disconnected | LinkError::Transport(_) => ErrorKind::Unknown,
        }
    }

    /// Fatal errors leave the byte stream desynchronized and halt the control loop.
    pub fn is_fatal(&self) -> bool {
        match self {
            LinkError::Disconnected | LinkError::Transport(_) => true,
            other => other.kind().is_desync(),
        }
    }
}

impl From<PayloadError> for LinkError {
    fn from(value: PayloadError) -> Self {
        Self::BadPayload(value)
    }
}

impl<E: embedded_io::Error> From<embedded_io::ReadExactError<E>> for LinkError {
    fn from(value: embedded_io::ReadExactError<E>) -> Self {
        match value {
            embedded_io::ReadExactError::UnexpectedEof => Self::Disconnected,
            embedded_io::ReadExactError::Other(err) => Self::Transport(err.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatality() {
        assert!(LinkError::FrameTooLong { declared: 200 }.is_fatal());
        assert!(LinkError::LengthMismatch { declared: 2, actual: 3 }.is_fatal());
        assert!(LinkError::UnexpectedByte { expected: 0x5A, found: 0 }.is_fatal());
        assert!(LinkError::TooManyFrames.is_fatal());
        assert!(LinkError::Disconnected.is_fatal());

        assert!(!LinkError::BadMessageType(9).is_fatal());
        assert!(!LinkError::BadSubsystem(9).is_fatal());
        assert!(!LinkError::UnexpectedContinuation.is_fatal());
        assert!(!LinkError::BadRequest("empty").is_fatal());
        assert_eq!(LinkError::BadSubsystem(9).kind(), ErrorKind::BadRequest);
    }
}
