//! Pan the servo across a set of angles and sample both range finders at each one.

use embedded_io::{Read, Write};
use heapless::Vec;
use rover_messages::messages::host_to_rover::decode_pulse_widths;
use rover_messages::messages::rover_to_host::ScanGroup;
use rover_messages::{MAX_SCAN_ANGLES, MAX_SCAN_FRAMES, SAMPLES_PER_ANGLE};

use crate::Rover;
use crate::error::LinkError;
use crate::stream::stream_samples;
use crate::subsystems::{ErrorReporter, Hardware, PanServo, RangeSensor};

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    pub(crate) fn scan(&mut self) -> Result<(), LinkError> {
        let mut pulse_widths: Vec<u16, MAX_SCAN_ANGLES> = Vec::new();
        let mut odd_frame = false;

        for index in 0..MAX_SCAN_FRAMES {
            let frame = self.link.read_frame()?;
            match decode_pulse_widths(frame.payload) {
                Some(decoded) => {
                    for pulse_width in decoded {
                        if pulse_widths.push(pulse_width).is_err() {
                            break;
                        }
                    }
                }
                None => odd_frame = true,
            }

            if !frame.more {
                break;
            }
            if index + 1 == MAX_SCAN_FRAMES {
                return Err(LinkError::TooManyFrames);
            }
        }

        // Every frame is consumed before rejecting, so the stop marker is next
        if odd_frame {
            return Err(LinkError::BadRequest("scan frame holds a partial pulse width"));
        }

        let hardware = &mut self.hardware;
        let frames = stream_samples(&mut self.link, pulse_widths.len(), |index| {
            hardware.servo().set_pulse_width(pulse_widths[index]);
            let mut group = ScanGroup::default();
            for reading in group.infrared.iter_mut() {
                *reading = hardware.infrared().raw_reading();
            }
            for reading in group.sonar.iter_mut() {
                *reading = hardware.sonar().raw_reading();
            }
            group
        })?;
        debug!(
            "scanned {} angles, {} readings each, in {} frames",
            pulse_widths.len(),
            SAMPLES_PER_ANGLE * 2,
            frames
        );
        Ok(())
    }
}
