#![cfg_attr(not(test), no_std)]

//! Rover side of the serial control link.
//!
//! [`Rover::run`] reads messages off a blocking byte transport, dispatches them to the onboard
//! components behind the [`subsystems`] traits and writes the responses back. Every message is
//! answered inside the same envelope it arrived in:
//!
//! ```text
//! Message := START MessageType Body STOP
//! ```

// Must come first so the logging macros are visible to every other module
mod fmt;

mod dispatch;
pub mod error;
pub mod frame;
mod scan;
pub mod stream;
pub mod subsystems;
#[cfg(test)]
mod testing;

use core::convert::Infallible;

use embedded_io::{Read, Write};
use rover_messages::{START_MARKER, STOP_MARKER};

use crate::error::LinkError;
use crate::frame::Link;
use crate::subsystems::{Display, ErrorReporter, Hardware};

/// Longest text handed to the error reporter, in bytes. Longer messages are cut short at a
/// character boundary.
pub const REPORT_LEN: usize = 96;

pub(crate) type ReportText = heapless::String<REPORT_LEN>;

/// Fills a [`ReportText`] character by character and drops everything after the first
/// character that does not fit.
struct Truncating<'a> {
    text: &'a mut ReportText,
    full: bool,
}

impl core::fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            if self.full || self.text.push(c).is_err() {
                self.full = true;
                break;
            }
        }
        Ok(())
    }
}

/// Format `args` into reporter text of at most `REPORT_LEN` bytes.
pub(crate) fn report_text(args: core::fmt::Arguments<'_>) -> ReportText {
    let mut text = ReportText::new();
    let mut writer = Truncating {
        text: &mut text,
        full: false,
    };
    // The writer never fails, overflow is handled by truncation
    let _ = core::fmt::write(&mut writer, args);
    text
}

/// Control loop settings.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Shown on the display when the control loop starts.
    pub banner: Option<&'static str>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            banner: Some("Control Mode"),
        }
    }
}

/// Where the envelope of the current message stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnvelopeState {
    Idle,
    AwaitStart,
    ReadType,
    /// Holds the raw message type byte.
    Dispatching(u8),
    AwaitStop,
}

/// The rover end of the link. Owns the transport, the onboard components and the error reporter.
pub struct Rover<T, H, R> {
    pub(crate) link: Link<T>,
    pub(crate) hardware: H,
    pub(crate) reporter: R,
    config: Config,
}

impl<T, H, R> Rover<T, H, R>
where
    T: Read + Write,
    H: Hardware,
    R: ErrorReporter,
{
    pub fn new(transport: T, hardware: H, reporter: R, config: Config) -> Self {
        Self {
            link: Link::new(transport),
            hardware,
            reporter,
            config,
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_parts(self) -> (T, H, R) {
        (self.link.into_inner(), self.hardware, self.reporter)
    }

    /// Serve messages until the link fails. Only returns on a fatal error, which has already
    /// been handed to the reporter.
    pub fn run(&mut self) -> Result<Infallible, LinkError> {
        if let Some(banner) = self.config.banner {
            let display = self.hardware.display();
            display.clear();
            display.print(banner);
        }
        info!("control loop started");

        loop {
            self.process_message()?;
        }
    }

    /// Handle exactly one message, from its start marker to its stop marker.
    ///
    /// Rejected requests are reported and still closed with a stop marker. Errors that leave the
    /// byte stream out of step are reported and returned.
    pub fn process_message(&mut self) -> Result<(), LinkError> {
        match self.envelope() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    fn envelope(&mut self) -> Result<(), LinkError> {
        let mut state = EnvelopeState::AwaitStart;
        loop {
            state = match state {
                EnvelopeState::Idle => return Ok(()),
                EnvelopeState::AwaitStart => {
                    self.link.expect_byte(START_MARKER)?;
                    EnvelopeState::ReadType
                }
                EnvelopeState::ReadType => EnvelopeState::Dispatching(self.link.receive_byte()?),
                EnvelopeState::Dispatching(code) => {
                    self.link.send(&[START_MARKER, code])?;
                    match self.dispatch(code) {
                        Ok(()) => {}
                        Err(err) if !err.is_fatal() => self.report(&err),
                        Err(err) => return Err(err),
                    }
                    EnvelopeState::AwaitStop
                }
                EnvelopeState::AwaitStop => {
                    self.link.send(&[STOP_MARKER])?;
                    self.link.expect_byte(STOP_MARKER)?;
                    EnvelopeState::Idle
                }
            };
        }
    }

    fn report(&mut self, err: &LinkError) {
        if err.is_fatal() {
            error!("link halted: {}", err);
        } else {
            warn!("request rejected: {}", err);
        }

        let message = report_text(format_args!("{}", err));
        self.reporter.report(err.kind(), &message);
    }
}
