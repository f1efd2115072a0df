use embedded_io::{Read, Write};
use rover_messages::{DisplayCommand, SubsystemId};

use super::{Display, ErrorReporter, Hardware, command_code};
use crate::Rover;
use crate::error::LinkError;

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    pub(crate) fn display_command(&mut self, code: u8) -> Result<(), LinkError> {
        match command_code(SubsystemId::Display, code)? {
            DisplayCommand::Clear => self.hardware.display().clear(),
            DisplayCommand::Print => {
                let text = core::str::from_utf8(self.link.read_single_frame()?)
                    .map_err(|_| LinkError::BadRequest("display text is not valid UTF-8"))?;
                self.hardware.display().print(text);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rover_messages::{MessageType, STOP_MARKER, START_MARKER};

    use crate::testing::{message_bytes, run_messages};

    const DISPLAY: u8 = 0;

    #[test]
    fn test_print_and_clear() {
        let mut input = message_bytes(&[MessageType::Command as u8, DISPLAY, 1], &[(b"hello", false)]);
        input.extend(message_bytes(&[MessageType::Command as u8, DISPLAY, 1], &[(b" rover", false)]));
        let (rover, written) = run_messages(&input);

        assert_eq!(rover.hardware().display.text, "hello rover");
        assert_eq!(
            written[..4],
            [START_MARKER, MessageType::Command as u8, DISPLAY, STOP_MARKER]
        );

        let (rover, _) = run_messages(&message_bytes(&[MessageType::Command as u8, DISPLAY, 0], &[]));
        assert_eq!(rover.hardware().display.clears, 1);
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let input = message_bytes(&[MessageType::Command as u8, DISPLAY, 1], &[(&[0xFF, 0xFE], false)]);
        let (rover, written) = run_messages(&input);

        assert!(rover.hardware().display.text.is_empty());
        assert_eq!(rover.reporter().reports.len(), 1);
        assert_eq!(written.last(), Some(&STOP_MARKER));
    }
}
