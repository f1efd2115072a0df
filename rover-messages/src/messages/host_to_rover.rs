//!  Request payloads sent to the rover

use serde::{Deserialize, Serialize};

use crate::FixedPayload;

/// Asks a range sensor for `count` readings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DistanceReadingRequest {
    #[serde(with = "postcard::fixint::le")]
    pub count: u16,
    /// Raw ADC samples instead of converted distances.
    pub raw: bool,
    // Accepted but not used to shape the response yet.
    pub randomized: bool,
    pub timestamps: bool,
}

impl FixedPayload for DistanceReadingRequest {
    const ENCODED_LEN: usize = 5;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveRequest {
    /// Negative distances drive backwards.
    #[serde(with = "postcard::fixint::le")]
    pub distance_mm: i16,
    #[serde(with = "postcard::fixint::le")]
    pub speed: i16,
}

impl FixedPayload for MoveRequest {
    const ENCODED_LEN: usize = 4;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotateRequest {
    /// Positive is counter-clockwise.
    #[serde(with = "postcard::fixint::le")]
    pub angle_deg: i16,
}

impl FixedPayload for RotateRequest {
    const ENCODED_LEN: usize = 2;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoRequest {
    #[serde(with = "postcard::fixint::le")]
    pub pulse_width: u16,
}

impl FixedPayload for ServoRequest {
    const ENCODED_LEN: usize = 2;
}

/// Pulse widths of a scan request, packed as consecutive little-endian `u16`s.
pub fn encode_pulse_widths(pulse_widths: &[u16], out: &mut [u8]) -> usize {
    for (chunk, pulse_width) in out.chunks_exact_mut(2).zip(pulse_widths) {
        chunk.copy_from_slice(&pulse_width.to_le_bytes());
    }
    pulse_widths.len().min(out.len() / 2) * 2
}

/// Inverse of [`encode_pulse_widths`]. Returns `None` for an odd number of bytes.
pub fn decode_pulse_widths(bytes: &[u8]) -> Option<impl Iterator<Item = u16> + '_> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(2)
            .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]])),
    )
}
