use embedded_io::{Read, Write};
use rover_messages::messages::host_to_rover::{MoveRequest, RotateRequest};
use rover_messages::messages::rover_to_host::StopReason;
use rover_messages::{DriveBaseCommand, SubsystemId};

use super::{DriveBase, ErrorReporter, Hardware, command_code};
use crate::Rover;
use crate::error::LinkError;

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    pub(crate) fn drive_base_command(&mut self, code: u8) -> Result<(), LinkError> {
        match command_code(SubsystemId::DriveBase, code)? {
            DriveBaseCommand::Move => {
                let request: MoveRequest = self.link.read_payload()?;
                info!("move {} mm at {}", request.distance_mm, request.speed);
                let report = self
                    .hardware
                    .drive_base()
                    .move_distance(request.distance_mm, request.speed);
                if report.stop != StopReason::FullDistance {
                    warn!("move stopped after {} mm: {}", report.travelled_mm, report.stop);
                }
                self.link.write_payload(&report)
            }
            DriveBaseCommand::Rotate => {
                let request: RotateRequest = self.link.read_payload()?;
                let report = self.hardware.drive_base().rotate(request.angle_deg);
                self.link.write_payload(&report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rover_messages::messages::host_to_rover::{MoveRequest, RotateRequest};
    use rover_messages::messages::rover_to_host::{MoveReport, RotateReport, StopReason};
    use rover_messages::{ErrorKind, FixedPayload, MessageType, START_MARKER, STOP_MARKER};

    use crate::testing::{message_bytes, parse_frames, run_messages};

    const DRIVE_BASE: u8 = 1;

    #[test]
    fn test_move_reports_stop_reason() {
        let mut buf = [0; 8];
        let request = MoveRequest {
            distance_mm: 400,
            speed: 300,
        }
        .encode(&mut buf)
        .unwrap()
        .to_vec();
        let input = message_bytes(&[MessageType::Command as u8, DRIVE_BASE, 0], &[(&request, false)]);
        let (rover, written) = run_messages(&input);

        assert_eq!(rover.hardware().drive_base.moves, [(400, 300)]);
        assert_eq!(written[..3], [START_MARKER, MessageType::Command as u8, DRIVE_BASE]);
        let (frames, end) = parse_frames(&written, 3);
        assert_eq!(
            MoveReport::decode(&frames[0].0),
            Ok(MoveReport {
                travelled_mm: 200,
                stop: StopReason::LeftBumper
            })
        );
        assert_eq!(written[end..], [STOP_MARKER]);
    }

    #[test]
    fn test_rotate() {
        let mut buf = [0; 8];
        let request = RotateRequest { angle_deg: -90 }.encode(&mut buf).unwrap().to_vec();
        let input = message_bytes(&[MessageType::Command as u8, DRIVE_BASE, 1], &[(&request, false)]);
        let (_, written) = run_messages(&input);

        let (frames, _) = parse_frames(&written, 3);
        assert_eq!(
            RotateReport::decode(&frames[0].0),
            Ok(RotateReport { rotated_deg: -91 })
        );
    }

    #[test]
    fn test_short_move_request_is_rejected() {
        let input = message_bytes(&[MessageType::Command as u8, DRIVE_BASE, 0], &[(&[1, 0], false)]);
        let (rover, written) = run_messages(&input);

        assert!(rover.hardware().drive_base.moves.is_empty());
        assert_eq!(rover.reporter().reports[0].0, ErrorKind::BadRequest);
        // No response frame, straight to the stop marker
        assert_eq!(
            written,
            [START_MARKER, MessageType::Command as u8, DRIVE_BASE, STOP_MARKER]
        );
    }

    #[test]
    fn test_unknown_command() {
        let input = message_bytes(&[MessageType::Command as u8, DRIVE_BASE, 7], &[]);
        let (rover, _) = run_messages(&input);
        assert_eq!(rover.reporter().reports[0].0, ErrorKind::BadRequest);
    }
}
