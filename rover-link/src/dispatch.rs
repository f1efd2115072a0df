//! Routes a message to its handler by type and, for commands, by subsystem.

use embedded_io::{Read, Write};
use rover_messages::{ErrorKind, MessageType, SubsystemId, UnknownCode};

use crate::error::LinkError;
use crate::{Rover, report_text};
use crate::subsystems::{ErrorReporter, Hardware, range_command};

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    /// Run the handler for message type `code`. The start marker and type byte are already out.
    pub(crate) fn dispatch(&mut self, code: u8) -> Result<(), LinkError> {
        let message_type =
            MessageType::try_from(code).map_err(|UnknownCode(code)| LinkError::BadMessageType(code))?;
        trace!("dispatching {}", message_type);

        match message_type {
            MessageType::Error => self.remote_error(),
            // The echoed type byte is the whole reply
            MessageType::Ping => Ok(()),
            MessageType::Echo => {
                while self.link.echo_frame()? {}
                Ok(())
            }
            MessageType::Command => self.command(),
            MessageType::SeedRng => self.seed_rng(),
            MessageType::Scan => self.scan(),
        }
    }

    fn command(&mut self) -> Result<(), LinkError> {
        // Both bytes are always present, so they are consumed before either is checked
        let id = self.link.receive_byte()?;
        let code = self.link.receive_byte()?;
        let subsystem = SubsystemId::try_from(id).map_err(|UnknownCode(id)| LinkError::BadSubsystem(id))?;
        self.link.send(&[id])?;

        match subsystem {
            SubsystemId::Display => self.display_command(code),
            SubsystemId::DriveBase => self.drive_base_command(code),
            SubsystemId::RangeSonar => range_command(&mut self.link, self.hardware.sonar(), subsystem, code),
            SubsystemId::Servo => self.servo_command(code),
            SubsystemId::InfraredRange => {
                range_command(&mut self.link, self.hardware.infrared(), subsystem, code)
            }
        }
    }

    /// An error the controller ran into, forwarded to the local reporter.
    fn remote_error(&mut self) -> Result<(), LinkError> {
        let payload = self.link.read_single_frame()?;
        let (&kind, text) = payload
            .split_first()
            .ok_or(LinkError::BadRequest("error report without a kind"))?;

        let kind = ErrorKind::try_from(kind).unwrap_or(ErrorKind::Unknown);
        let text = core::str::from_utf8(text).unwrap_or("<invalid utf-8>");
        warn!("controller reported {}: {}", kind, text);
        self.reporter.report(kind, &report_text(format_args!("{}", text)));
        Ok(())
    }

    fn seed_rng(&mut self) -> Result<(), LinkError> {
        let seed = self.link.read_single_frame()?;
        if seed.is_empty() {
            return Err(LinkError::BadRequest("empty seed"));
        }
        debug!("seeding rng with {} bytes", seed.len());
        self.hardware.seed_rng(seed);
        Ok(())
    }
}
