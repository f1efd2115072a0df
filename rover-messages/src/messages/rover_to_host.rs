//!  Sensor and drive data returned to the controller

use serde::{Deserialize, Serialize};

use crate::{FixedPayload, SAMPLES_PER_ANGLE, Sample};

/// Why the drive base ended a move.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopReason {
    FullDistance,
    LeftBumper,
    RightBumper,
    BothBumpers,
    LeftCliff,
    RightCliff,
    FrontLeftCliff,
    FrontRightCliff,
    WhiteTapeLeft,
    WhiteTapeRight,
    WhiteTapeFrontLeft,
    WhiteTapeFrontRight,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    #[serde(with = "postcard::fixint::le")]
    pub travelled_mm: i16,
    pub stop: StopReason,
}

impl FixedPayload for MoveReport {
    const ENCODED_LEN: usize = 3;
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RotateReport {
    #[serde(with = "postcard::fixint::le")]
    pub rotated_deg: i16,
}

impl FixedPayload for RotateReport {
    const ENCODED_LEN: usize = 2;
}

/// Raw readings taken at one scan angle: all infrared samples, then all sonar samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanGroup {
    pub infrared: [u16; SAMPLES_PER_ANGLE],
    pub sonar: [u16; SAMPLES_PER_ANGLE],
}

impl Sample for ScanGroup {
    const ENCODED_LEN: usize = 2 * SAMPLES_PER_ANGLE * 2;

    fn encode(&self, out: &mut [u8]) {
        let readings = self.infrared.iter().chain(self.sonar.iter());
        for (chunk, reading) in out.chunks_exact_mut(2).zip(readings) {
            reading.encode(chunk);
        }
    }

    fn decode(bytes: &[u8]) -> Self {
        let mut group = ScanGroup::default();
        let (infrared, sonar) = bytes[..Self::ENCODED_LEN].split_at(SAMPLES_PER_ANGLE * 2);
        for (reading, chunk) in group.infrared.iter_mut().zip(infrared.chunks_exact(2)) {
            *reading = u16::decode(chunk);
        }
        for (reading, chunk) in group.sonar.iter_mut().zip(sonar.chunks_exact(2)) {
            *reading = u16::decode(chunk);
        }
        group
    }
}
