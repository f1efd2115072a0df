//! Length delimited data frames over a blocking byte transport.
//!
//! ```text
//! Frame := DeclaredLen Payload[DeclaredLen] TrueLen Continuation
//! ```
//!
//! The length is sent twice. The receiver only trusts the first `TrueLen` payload bytes and
//! treats a trailing length larger than the leading one as a desynchronized link.

use embedded_io::{Read, Write};
use rover_messages::{FixedPayload, MAX_FRAME_LEN};

use crate::error::LinkError;

/// A received frame. Borrows the link's receive buffer, so it is only valid until the next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub payload: &'a [u8],
    /// Another frame of the same message follows.
    pub more: bool,
}

/// Byte transport plus the frame buffers used on it.
///
/// Requests are parsed out of `rx` and responses are assembled in `tx`, so a handler can keep
/// reading request frames while it writes response frames.
pub struct Link<T> {
    transport: T,
    rx: [u8; MAX_FRAME_LEN],
    rx_len: usize,
    tx: [u8; MAX_FRAME_LEN],
}

impl<T> Link<T>
where
    T: Read + Write,
{
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            rx: [0; MAX_FRAME_LEN],
            rx_len: 0,
            tx: [0; MAX_FRAME_LEN],
        }
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Block until one byte arrives.
    pub fn receive_byte(&mut self) -> Result<u8, LinkError> {
        let mut byte = [0; 1];
        self.transport.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Block until one byte arrives and require it to be `expected`.
    pub fn expect_byte(&mut self, expected: u8) -> Result<(), LinkError> {
        match self.receive_byte()? {
            found if found == expected => Ok(()),
            found => Err(LinkError::UnexpectedByte { expected, found }),
        }
    }

    /// Enqueue raw bytes (markers, codes) and flush them.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.transport
            .write_all(bytes)
            .map_err(|err| LinkError::Transport(embedded_io::Error::kind(&err)))?;
        self.transport
            .flush()
            .map_err(|err| LinkError::Transport(embedded_io::Error::kind(&err)))
    }

    /// Read one frame into the receive buffer.
    pub fn read_frame(&mut self) -> Result<Frame<'_>, LinkError> {
        let declared = self.receive_byte()?;
        self.read_frame_declared(declared)
    }

    /// Read the rest of a frame whose leading length byte the caller already consumed.
    pub fn read_frame_declared(&mut self, declared: u8) -> Result<Frame<'_>, LinkError> {
        if declared as usize > MAX_FRAME_LEN {
            return Err(LinkError::FrameTooLong { declared });
        }

        self.transport.read_exact(&mut self.rx[..declared as usize])?;

        let actual = self.receive_byte()?;
        if actual > declared {
            return Err(LinkError::LengthMismatch { declared, actual });
        }
        self.rx_len = actual as usize;

        let more = self.receive_byte()? != 0;
        Ok(Frame {
            payload: &self.rx[..self.rx_len],
            more,
        })
    }

    /// Write `payload` as one frame. The caller keeps `payload` within `MAX_FRAME_LEN`.
    pub fn write_frame(&mut self, payload: &[u8], more: bool) -> Result<(), LinkError> {
        debug_assert!(payload.len() <= MAX_FRAME_LEN);
        let len = payload.len() as u8;

        // Header and trailer go out with the payload before anything else is read
        let mut frame = [0; MAX_FRAME_LEN + 3];
        frame[0] = len;
        frame[1..=payload.len()].copy_from_slice(payload);
        frame[payload.len() + 1] = len;
        frame[payload.len() + 2] = more as u8;
        self.send(&frame[..payload.len() + 3])
    }

    /// Mutable access to the transmit buffer, to be sent with [`Link::write_tx`].
    pub fn tx_mut(&mut self) -> &mut [u8; MAX_FRAME_LEN] {
        &mut self.tx
    }

    /// Write the first `len` bytes of the transmit buffer as one frame.
    pub fn write_tx(&mut self, len: usize, more: bool) -> Result<(), LinkError> {
        let tx = self.tx;
        self.write_frame(&tx[..len], more)
    }

    /// Read one frame and write it straight back. Returns the continuation flag.
    pub fn echo_frame(&mut self) -> Result<bool, LinkError> {
        let more = self.read_frame()?.more;
        let rx = self.rx;
        self.write_frame(&rx[..self.rx_len], more)?;
        Ok(more)
    }

    /// Read a request that must fit in one frame.
    ///
    /// If the sender flagged more frames they are drained, so the link stays in step, and the
    /// request is rejected.
    pub fn read_single_frame(&mut self) -> Result<&[u8], LinkError> {
        if self.read_frame()?.more {
            while self.read_frame()?.more {}
            return Err(LinkError::UnexpectedContinuation);
        }
        Ok(&self.rx[..self.rx_len])
    }

    /// Read and decode a single frame request.
    pub fn read_payload<P: FixedPayload>(&mut self) -> Result<P, LinkError> {
        Ok(P::decode(self.read_single_frame()?)?)
    }

    /// Encode `payload` into the transmit buffer and send it as the last frame of a response.
    pub fn write_payload<P: FixedPayload>(&mut self, payload: &P) -> Result<(), LinkError> {
        let len = payload.encode(&mut self.tx)?.len();
        self.write_tx(len, false)
    }
}
