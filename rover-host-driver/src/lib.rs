//! Controller side of the rover link.
//!
//! [`RoverClient`] speaks the same framing as the rover over any blocking `std::io` stream,
//! typically a serial port opened as a file. Every call writes one complete request message and
//! then reads the whole response, including the closing stop marker.

use std::io;

use anyhow::{Context, Result, bail, ensure};
use embedded_io_adapters::std::FromStd;
use rover_link::frame::Link;
use rover_messages::messages::host_to_rover::{
    DistanceReadingRequest, MoveRequest, RotateRequest, ServoRequest, encode_pulse_widths,
};
use rover_messages::messages::rover_to_host::{MoveReport, RotateReport, ScanGroup};
use rover_messages::{
    DisplayCommand, DriveBaseCommand, ErrorKind, MAX_FRAME_LEN, MAX_SCAN_ANGLES,
    MessageType, RangeCommand, START_MARKER, STOP_MARKER, Sample, ServoCommand, SubsystemId,
};

/// The two range finders on the rover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeFinder {
    Sonar,
    Infrared,
}

impl From<RangeFinder> for SubsystemId {
    fn from(value: RangeFinder) -> Self {
        match value {
            RangeFinder::Sonar => SubsystemId::RangeSonar,
            RangeFinder::Infrared => SubsystemId::InfraredRange,
        }
    }
}

pub struct RoverClient<S: io::Read + io::Write> {
    link: Link<FromStd<S>>,
}

impl<S: io::Read + io::Write> RoverClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            link: Link::new(FromStd::new(stream)),
        }
    }

    pub fn into_inner(self) -> S {
        self.link.into_inner().into_inner()
    }

    pub fn ping(&mut self) -> Result<()> {
        self.request(MessageType::Ping)?;
        self.finish_request()?;
        self.expect_envelope(MessageType::Ping)?;
        self.expect_stop()
    }

    /// Send `frames` as one echo message and return what came back.
    pub fn echo(&mut self, frames: &[&[u8]]) -> Result<Vec<Vec<u8>>> {
        ensure!(!frames.is_empty(), "echo needs at least one frame");
        ensure!(
            frames.iter().all(|frame| frame.len() <= MAX_FRAME_LEN),
            "echo frames are limited to {MAX_FRAME_LEN} bytes"
        );

        self.request(MessageType::Echo)?;
        for (index, frame) in frames.iter().enumerate() {
            self.link.write_frame(frame, index + 1 < frames.len())?;
        }
        self.finish_request()?;

        self.expect_envelope(MessageType::Echo)?;
        let mut echoed = Vec::with_capacity(frames.len());
        loop {
            let frame = self.link.read_frame().context("Failed to read echoed frame")?;
            echoed.push(frame.payload.to_vec());
            if !frame.more {
                break;
            }
        }
        self.expect_stop()?;
        Ok(echoed)
    }

    /// Tell the rover about an error seen on this side of the link.
    pub fn report_error(&mut self, kind: ErrorKind, message: &str) -> Result<()> {
        ensure!(
            message.len() < MAX_FRAME_LEN,
            "error message must fit in one frame next to its kind"
        );
        let mut payload = Vec::with_capacity(message.len() + 1);
        payload.push(u8::from(kind));
        payload.extend_from_slice(message.as_bytes());

        self.request(MessageType::Error)?;
        self.link.write_frame(&payload, false)?;
        self.finish_request()?;
        self.expect_envelope(MessageType::Error)?;
        self.expect_stop()
    }

    pub fn seed_rng(&mut self, seed: &[u8]) -> Result<()> {
        ensure!(
            (1..=MAX_FRAME_LEN).contains(&seed.len()),
            "seed must be 1 to {MAX_FRAME_LEN} bytes, got {}",
            seed.len()
        );

        self.request(MessageType::SeedRng)?;
        self.link.write_frame(seed, false)?;
        self.finish_request()?;
        self.expect_envelope(MessageType::SeedRng)?;
        self.expect_stop()
    }

    pub fn display_clear(&mut self) -> Result<()> {
        self.command(SubsystemId::Display, DisplayCommand::Clear.into())?;
        self.finish_request()?;
        self.expect_command(SubsystemId::Display)?;
        self.expect_stop()
    }

    pub fn display_print(&mut self, text: &str) -> Result<()> {
        ensure!(text.len() <= MAX_FRAME_LEN, "display text must fit in one frame");

        self.command(SubsystemId::Display, DisplayCommand::Print.into())?;
        self.link.write_frame(text.as_bytes(), false)?;
        self.finish_request()?;
        self.expect_command(SubsystemId::Display)?;
        self.expect_stop()
    }

    /// Drive straight. Negative distances drive backwards.
    pub fn move_distance(&mut self, distance_mm: i16, speed: i16) -> Result<MoveReport> {
        self.command(SubsystemId::DriveBase, DriveBaseCommand::Move.into())?;
        self.link.write_payload(&MoveRequest { distance_mm, speed })?;
        self.finish_request()?;

        self.expect_command(SubsystemId::DriveBase)?;
        let report = self.link.read_payload().context("Failed to read move report")?;
        self.expect_stop()?;
        Ok(report)
    }

    pub fn rotate(&mut self, angle_deg: i16) -> Result<RotateReport> {
        self.command(SubsystemId::DriveBase, DriveBaseCommand::Rotate.into())?;
        self.link.write_payload(&RotateRequest { angle_deg })?;
        self.finish_request()?;

        self.expect_command(SubsystemId::DriveBase)?;
        let report = self.link.read_payload().context("Failed to read rotate report")?;
        self.expect_stop()?;
        Ok(report)
    }

    pub fn set_servo(&mut self, pulse_width: u16) -> Result<()> {
        self.command(SubsystemId::Servo, ServoCommand::SetPulseWidth.into())?;
        self.link.write_payload(&ServoRequest { pulse_width })?;
        self.finish_request()?;
        self.expect_command(SubsystemId::Servo)?;
        self.expect_stop()
    }

    pub fn init_sensor(&mut self, sensor: RangeFinder) -> Result<()> {
        self.command(sensor.into(), RangeCommand::Init.into())?;
        self.finish_request()?;
        self.expect_command(sensor.into())?;
        self.expect_stop()
    }

    /// Sensor native samples, one per reading.
    pub fn read_raw(&mut self, sensor: RangeFinder, count: u16) -> Result<Vec<u16>> {
        self.read_distances(sensor, count, true)
    }

    /// Readings converted to centimeters.
    pub fn read_converted(&mut self, sensor: RangeFinder, count: u16) -> Result<Vec<f32>> {
        self.read_distances(sensor, count, false)
    }

    /// Pan the servo through `pulse_widths`, returning the readings taken at each angle.
    pub fn scan(&mut self, pulse_widths: &[u16]) -> Result<Vec<ScanGroup>> {
        ensure!(
            pulse_widths.len() <= MAX_SCAN_ANGLES,
            "a scan covers at most {MAX_SCAN_ANGLES} angles, got {}",
            pulse_widths.len()
        );

        self.request(MessageType::Scan)?;
        if pulse_widths.is_empty() {
            self.link.write_frame(&[], false)?;
        }
        let chunks = pulse_widths.chunks(MAX_FRAME_LEN / 2);
        let last = chunks.len().saturating_sub(1);
        let mut buf = [0; MAX_FRAME_LEN];
        for (index, chunk) in chunks.enumerate() {
            let len = encode_pulse_widths(chunk, &mut buf);
            self.link.write_frame(&buf[..len], index < last)?;
        }
        self.finish_request()?;

        self.expect_envelope(MessageType::Scan)?;
        let groups = self.read_samples(pulse_widths.len())?;
        self.expect_stop()?;
        Ok(groups)
    }

    fn read_distances<T: Sample>(&mut self, sensor: RangeFinder, count: u16, raw: bool) -> Result<Vec<T>> {
        let request = DistanceReadingRequest {
            count,
            raw,
            randomized: false,
            timestamps: false,
        };
        self.command(sensor.into(), RangeCommand::Read.into())?;
        self.link.write_payload(&request)?;
        self.finish_request()?;

        self.expect_command(sensor.into())?;
        let readings = self
            .read_samples(count as usize)
            .with_context(|| format!("Failed to read {count} readings from {sensor:?}"))?;
        self.expect_stop()?;
        Ok(readings)
    }

    fn read_samples<T: Sample>(&mut self, count: usize) -> Result<Vec<T>> {
        let mut samples = Vec::with_capacity(count);
        // Nothing is streamed for an empty request
        if count == 0 {
            return Ok(samples);
        }

        // The first frame's size is known, so a stop marker in its place is a rejection. The two
        // only coincide for a 90 byte first frame.
        let expected = count.min(T::per_frame()) * T::ENCODED_LEN;
        let mut declared = self.link.receive_byte()?;
        if declared as usize != expected {
            ensure!(declared != STOP_MARKER, "rover rejected the request");
            bail!("expected a first frame of {expected} bytes, rover declared {declared}");
        }

        loop {
            let frame = self.link.read_frame_declared(declared)?;
            ensure!(
                frame.payload.len() % T::ENCODED_LEN == 0,
                "frame of {} bytes does not hold whole samples",
                frame.payload.len()
            );
            samples.extend(frame.payload.chunks_exact(T::ENCODED_LEN).map(T::decode));
            if !frame.more {
                break;
            }
            declared = self.link.receive_byte()?;
        }

        ensure!(
            samples.len() == count,
            "expected {count} samples, rover streamed {}",
            samples.len()
        );
        Ok(samples)
    }

    fn request(&mut self, message_type: MessageType) -> Result<()> {
        self.link.send(&[START_MARKER, message_type.into()])?;
        Ok(())
    }

    fn command(&mut self, subsystem: SubsystemId, code: u8) -> Result<()> {
        self.link
            .send(&[START_MARKER, MessageType::Command.into(), subsystem.into(), code])?;
        Ok(())
    }

    fn finish_request(&mut self) -> Result<()> {
        self.link.send(&[STOP_MARKER])?;
        Ok(())
    }

    fn expect_envelope(&mut self, message_type: MessageType) -> Result<()> {
        self.link
            .expect_byte(START_MARKER)
            .context("Rover response did not start with a start marker")?;
        let echoed = self.link.receive_byte()?;
        ensure!(
            echoed == u8::from(message_type),
            "rover answered {message_type:?} with message type {echoed}"
        );
        Ok(())
    }

    fn expect_command(&mut self, subsystem: SubsystemId) -> Result<()> {
        self.expect_envelope(MessageType::Command)?;
        match self.link.receive_byte()? {
            id if id == u8::from(subsystem) => Ok(()),
            STOP_MARKER => bail!("rover rejected the {subsystem:?} command"),
            id => bail!("rover answered for subsystem {id} instead of {subsystem:?}"),
        }
    }

    fn expect_stop(&mut self) -> Result<()> {
        self.link
            .expect_byte(STOP_MARKER)
            .context("Rover response did not end with a stop marker")?;
        Ok(())
    }
}
