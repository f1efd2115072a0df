use embedded_io::{Read, Write};
use rover_messages::messages::host_to_rover::ServoRequest;
use rover_messages::{ServoCommand, SubsystemId};

use super::{ErrorReporter, Hardware, PanServo, command_code};
use crate::Rover;
use crate::error::LinkError;

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    pub(crate) fn servo_command(&mut self, code: u8) -> Result<(), LinkError> {
        match command_code(SubsystemId::Servo, code)? {
            ServoCommand::SetPulseWidth => {
                let request: ServoRequest = self.link.read_payload()?;
                trace!("servo pulse width {}", request.pulse_width);
                self.hardware.servo().set_pulse_width(request.pulse_width);
            }
        }
        Ok(())
    }
}
