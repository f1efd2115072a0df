//! Onboard components the link talks to, and the command handlers for each of them.
//!
//! The traits are the narrow interfaces the rest of the firmware implements: sensor physics,
//! kinematics, servo pulse generation and display rendering all live behind them.

use rover_messages::messages::rover_to_host::{MoveReport, RotateReport};
use rover_messages::{ErrorKind, SubsystemId, UnknownCode};

use crate::error::LinkError;

mod display;
mod drive_base;
mod range;
mod servo;

pub(crate) use range::range_command;

pub trait RangeSensor {
    /// Prepare the sensor for sampling.
    fn init(&mut self) {}

    /// Sensor native quantized sample.
    fn raw_reading(&mut self) -> u16;

    /// Sample converted to a distance in cm.
    fn converted_reading(&mut self) -> f32;
}

pub trait PanServo {
    fn set_pulse_width(&mut self, pulse_width: u16);
}

pub trait DriveBase {
    /// Drive straight, stopping early on bumps, cliffs and tape.
    fn move_distance(&mut self, distance_mm: i16, speed: i16) -> MoveReport;

    fn rotate(&mut self, angle_deg: i16) -> RotateReport;
}

pub trait Display {
    fn clear(&mut self);

    fn print(&mut self, text: &str);
}

/// Receives every error the link runs into. Fatal errors are reported once, right before the
/// control loop gives up.
pub trait ErrorReporter {
    fn report(&mut self, kind: ErrorKind, message: &str);
}

/// All components the rover exposes to the controller.
pub trait Hardware {
    type Display: Display;
    type DriveBase: DriveBase;
    type Sonar: RangeSensor;
    type Servo: PanServo;
    type Infrared: RangeSensor;

    fn display(&mut self) -> &mut Self::Display;

    fn drive_base(&mut self) -> &mut Self::DriveBase;

    fn sonar(&mut self) -> &mut Self::Sonar;

    fn servo(&mut self) -> &mut Self::Servo;

    fn infrared(&mut self) -> &mut Self::Infrared;

    /// Mix controller supplied entropy into the onboard random number generator.
    fn seed_rng(&mut self, seed: &[u8]);
}

/// Map a command byte for `subsystem`, rejecting codes it does not understand.
fn command_code<C>(subsystem: SubsystemId, code: u8) -> Result<C, LinkError>
where
    C: TryFrom<u8, Error = UnknownCode>,
{
    C::try_from(code).map_err(|UnknownCode(command)| LinkError::BadCommand {
        subsystem: subsystem.into(),
        command,
    })
}
