#![cfg_attr(not(test), no_std)]

//! Messages used by the rover for controller <--> rover communication.
//!
//! Both ends of the serial link share these definitions: the envelope markers, the one-byte
//! codes that select handlers, and the fixed-size payloads carried inside data frames.

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

pub mod messages;

/// Sync byte opening every message.
pub const START_MARKER: u8 = 0xA5;
/// Byte closing every message.
pub const STOP_MARKER: u8 = 0x5A;

/// Maximum number of payload bytes in one data frame.
/// Sender and receiver must agree on this exactly, there is no negotiation.
pub const MAX_FRAME_LEN: usize = 100;

/// Number of request frames a scan may span.
pub const MAX_SCAN_FRAMES: usize = 4;
/// Number of pulse widths a scan may carry.
pub const MAX_SCAN_ANGLES: usize = 200;
/// Readings taken per sensor at every scan angle.
pub const SAMPLES_PER_ANGLE: usize = 5;

/// A byte that does not name any known code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[error("unknown code {0:#04x}")]
pub struct UnknownCode(pub u8);

// Declares a `#[repr(u8)]` code enum with its wire conversions.
macro_rules! wire_codes {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(value: u8) -> Result<Self, UnknownCode> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    other => Err(UnknownCode(other)),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }
    };
}

wire_codes! {
    /// First byte after the start marker, selects the top level handler.
    pub enum MessageType {
        Error = 0,
        Ping = 1,
        Echo = 2,
        Command = 3,
        SeedRng = 4,
        Scan = 5,
    }
}

wire_codes! {
    /// Rover component addressed by a `Command` message.
    pub enum SubsystemId {
        Display = 0,
        DriveBase = 1,
        RangeSonar = 2,
        Servo = 3,
        InfraredRange = 4,
    }
}

wire_codes! {
    pub enum DisplayCommand {
        Clear = 0,
        Print = 1,
    }
}

wire_codes! {
    pub enum DriveBaseCommand {
        Move = 0,
        Rotate = 1,
    }
}

wire_codes! {
    /// Commands understood by both the sonar and the infrared range finder. Code 1 is
    /// reserved for on-board calibration, which the link does not expose.
    pub enum RangeCommand {
        Init = 0,
        Read = 2,
    }
}

wire_codes! {
    pub enum ServoCommand {
        SetPulseWidth = 0,
    }
}

wire_codes! {
    /// Classification handed to the error reporter, and carried by `Error` messages.
    pub enum ErrorKind {
        BadFraming = 0,
        BadMessageType = 1,
        BadRequest = 2,
        FrameTooLong = 3,
        LengthMismatch = 4,
        UnexpectedByte = 5,
        TooManyFrames = 6,
        Unknown = 7,
    }
}

impl ErrorKind {
    /// Byte level desynchronization kinds. The link cannot recover from these.
    pub fn is_desync(self) -> bool {
        matches!(
            self,
            ErrorKind::FrameTooLong
                | ErrorKind::LengthMismatch
                | ErrorKind::UnexpectedByte
                | ErrorKind::TooManyFrames
        )
    }
}

/// Failure to decode a fixed-size frame payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    #[error("expected {expected} payload bytes, got {found}")]
    WrongSize { expected: usize, found: usize },
    #[error("payload contents are malformed")]
    Malformed,
}

/// A payload occupying exactly one data frame with a fixed encoded size.
///
/// Integers are encoded as little-endian fixed width values, booleans and enum tags as one byte.
pub trait FixedPayload: Serialize + DeserializeOwned {
    const ENCODED_LEN: usize;

    /// Decode a frame payload, which must be exactly `ENCODED_LEN` bytes long.
    fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(PayloadError::WrongSize {
                expected: Self::ENCODED_LEN,
                found: bytes.len(),
            });
        }
        postcard::from_bytes(bytes).map_err(|_| PayloadError::Malformed)
    }

    /// Encode into `buf`, returning the used prefix.
    fn encode<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], PayloadError> {
        postcard::to_slice(self, buf).map_err(|_| PayloadError::Malformed)
    }
}

/// A fixed width element of a streamed response.
pub trait Sample: Sized {
    const ENCODED_LEN: usize;

    /// Writes exactly `ENCODED_LEN` bytes to the front of `out`.
    fn encode(&self, out: &mut [u8]);

    /// Reads from the first `ENCODED_LEN` bytes of `bytes`.
    fn decode(bytes: &[u8]) -> Self;

    /// Number of samples that fit in one data frame.
    fn per_frame() -> usize {
        MAX_FRAME_LEN / Self::ENCODED_LEN
    }
}

impl Sample for u16 {
    const ENCODED_LEN: usize = 2;

    fn encode(&self, out: &mut [u8]) {
        out[..2].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        u16::from_le_bytes([bytes[0], bytes[1]])
    }
}

impl Sample for f32 {
    const ENCODED_LEN: usize = 4;

    fn encode(&self, out: &mut [u8]) {
        out[..4].copy_from_slice(&self.to_le_bytes());
    }

    fn decode(bytes: &[u8]) -> Self {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for &message_type in MessageType::ALL {
            assert_eq!(MessageType::try_from(u8::from(message_type)), Ok(message_type));
        }
        for &subsystem in SubsystemId::ALL {
            assert_eq!(SubsystemId::try_from(u8::from(subsystem)), Ok(subsystem));
        }
        assert_eq!(MessageType::try_from(0), Ok(MessageType::Error));
        assert_eq!(MessageType::try_from(6), Err(UnknownCode(6)));
        assert_eq!(SubsystemId::try_from(9), Err(UnknownCode(9)));
    }

    #[test]
    fn test_range_command_codes() {
        assert_eq!(RangeCommand::try_from(0), Ok(RangeCommand::Init));
        assert_eq!(RangeCommand::try_from(1), Err(UnknownCode(1)));
        assert_eq!(RangeCommand::try_from(2), Ok(RangeCommand::Read));
        assert_eq!(u8::from(RangeCommand::Read), 2);
    }

    #[test]
    fn test_desync_kinds() {
        let desync: usize = ErrorKind::ALL.iter().filter(|kind| kind.is_desync()).count();
        assert_eq!(desync, 4);
        assert!(!ErrorKind::BadRequest.is_desync());
        assert!(!ErrorKind::BadMessageType.is_desync());
    }

    #[test]
    fn test_samples_per_frame() {
        assert_eq!(u16::per_frame(), 50);
        assert_eq!(f32::per_frame(), 25);

        let mut buf = [0; 4];
        1.5f32.encode(&mut buf);
        assert_eq!(f32::decode(&buf), 1.5);
        0x1234u16.encode(&mut buf);
        assert_eq!(buf[..2], [0x34, 0x12]);
    }
}
