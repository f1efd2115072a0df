//! In-memory serial port and hardware doubles for unit tests.

use core::convert::Infallible;
use std::string::{String, ToString};
use std::vec::Vec;

use embedded_io::{ErrorType, Read, Write};
use rover_messages::messages::rover_to_host::{MoveReport, RotateReport, StopReason};
use rover_messages::{ErrorKind, START_MARKER, STOP_MARKER};

use crate::error::LinkError;
use crate::subsystems::{Display, DriveBase, ErrorReporter, Hardware, PanServo, RangeSensor};
use crate::{Config, Rover};

/// Replays a fixed input and records everything written. Reads past the end report end of stream.
pub struct MockSerial {
    input: Vec<u8>,
    position: usize,
    pub written: Vec<u8>,
}

impl MockSerial {
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.to_vec(),
            position: 0,
            written: Vec::new(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.input.len() - self.position
    }
}

impl ErrorType for MockSerial {
    type Error = Infallible;
}

impl Read for MockSerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.input[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

impl Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Wire bytes of one frame.
pub fn frame_bytes(payload: &[u8], more: bool) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() + 3);
    bytes.push(payload.len() as u8);
    bytes.extend_from_slice(payload);
    bytes.push(payload.len() as u8);
    bytes.push(more as u8);
    bytes
}

/// Wire bytes of a whole message: markers around `header` codes followed by `frames`.
pub fn message_bytes(header: &[u8], frames: &[(&[u8], bool)]) -> Vec<u8> {
    let mut bytes = std::vec![START_MARKER];
    bytes.extend_from_slice(header);
    for (payload, more) in frames {
        bytes.extend(frame_bytes(payload, *more));
    }
    bytes.push(STOP_MARKER);
    bytes
}

/// Splits response bytes into frames starting at `offset`, up to and including the first frame
/// without a continuation flag. Returns the frames and the offset after them.
pub fn parse_frames(bytes: &[u8], mut offset: usize) -> (Vec<(Vec<u8>, bool)>, usize) {
    let mut frames = Vec::new();
    loop {
        let len = bytes[offset] as usize;
        let payload = bytes[offset + 1..offset + 1 + len].to_vec();
        let more = bytes[offset + 2 + len] != 0;
        frames.push((payload, more));
        offset += len + 3;
        if !more {
            return (frames, offset);
        }
    }
}

/// Produces 0, 1, 2, ... as raw readings and half that as converted readings.
#[derive(Default)]
pub struct CountingSensor {
    pub next: u16,
    pub initialized: bool,
}

impl RangeSensor for CountingSensor {
    fn init(&mut self) {
        self.initialized = true;
    }

    fn raw_reading(&mut self) -> u16 {
        let reading = self.next;
        self.next = self.next.wrapping_add(1);
        reading
    }

    fn converted_reading(&mut self) -> f32 {
        self.raw_reading() as f32 / 2.0
    }
}

#[derive(Default)]
pub struct RecordingServo {
    pub pulse_widths: Vec<u16>,
}

impl PanServo for RecordingServo {
    fn set_pulse_width(&mut self, pulse_width: u16) {
        self.pulse_widths.push(pulse_width);
    }
}

/// Travels half the requested distance and reports a bump on every forward move.
#[derive(Default)]
pub struct BumpingDriveBase {
    pub moves: Vec<(i16, i16)>,
}

impl DriveBase for BumpingDriveBase {
    fn move_distance(&mut self, distance_mm: i16, speed: i16) -> MoveReport {
        self.moves.push((distance_mm, speed));
        MoveReport {
            travelled_mm: distance_mm / 2,
            stop: if distance_mm > 0 {
                StopReason::LeftBumper
            } else {
                StopReason::FullDistance
            },
        }
    }

    fn rotate(&mut self, angle_deg: i16) -> RotateReport {
        RotateReport {
            rotated_deg: angle_deg - 1,
        }
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub text: String,
    pub clears: usize,
}

impl Display for RecordingDisplay {
    fn clear(&mut self) {
        self.text.clear();
        self.clears += 1;
    }

    fn print(&mut self, text: &str) {
        self.text.push_str(text);
    }
}

#[derive(Default)]
pub struct MockHardware {
    pub display: RecordingDisplay,
    pub drive_base: BumpingDriveBase,
    pub sonar: CountingSensor,
    pub servo: RecordingServo,
    pub infrared: CountingSensor,
    pub seed: Vec<u8>,
}

impl Hardware for MockHardware {
    type Display = RecordingDisplay;
    type DriveBase = BumpingDriveBase;
    type Sonar = CountingSensor;
    type Servo = RecordingServo;
    type Infrared = CountingSensor;

    fn display(&mut self) -> &mut Self::Display {
        &mut self.display
    }

    fn drive_base(&mut self) -> &mut Self::DriveBase {
        &mut self.drive_base
    }

    fn sonar(&mut self) -> &mut Self::Sonar {
        &mut self.sonar
    }

    fn servo(&mut self) -> &mut Self::Servo {
        &mut self.servo
    }

    fn infrared(&mut self) -> &mut Self::Infrared {
        &mut self.infrared
    }

    fn seed_rng(&mut self, seed: &[u8]) {
        self.seed = seed.to_vec();
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    pub reports: Vec<(ErrorKind, String)>,
}

impl ErrorReporter for RecordingReporter {
    fn report(&mut self, kind: ErrorKind, message: &str) {
        self.reports.push((kind, message.to_string()));
    }
}

pub type MockRover = Rover<MockSerial, MockHardware, RecordingReporter>;

/// Runs the control loop over `input` until it halts, returning the rover, the fatal error and
/// everything the rover wrote.
pub fn run_until_fatal(input: &[u8]) -> (MockRover, LinkError, Vec<u8>) {
    let mut config = Config::default();
    config.banner = None;

    let mut rover = Rover::new(
        MockSerial::new(input),
        MockHardware::default(),
        RecordingReporter::default(),
        config,
    );
    let err = match rover.run() {
        Ok(never) => match never {},
        Err(err) => err,
    };
    let written = rover.link.transport_mut().written.clone();
    (rover, err, written)
}

/// Runs a stream of well formed messages. The loop must only stop because the input ran out;
/// the resulting disconnect report is removed so tests see the reports of their own messages.
pub fn run_messages(input: &[u8]) -> (MockRover, Vec<u8>) {
    let (mut rover, err, written) = run_until_fatal(input);
    assert_eq!(err, LinkError::Disconnected);
    let last = rover.reporter.reports.pop();
    assert_eq!(last.map(|(kind, _)| kind), Some(ErrorKind::Unknown));
    (rover, written)
}
