//! Paginates a run of readings over as many response frames as needed.

use embedded_io::{Read, Write};
use rover_messages::Sample;

use crate::error::LinkError;
use crate::frame::Link;

/// Send `count` samples produced by `next`, packing `S::per_frame()` samples into each frame.
///
/// `next` is called with the index of the sample being produced. Every frame but the last has
/// its continuation flag set, and a count of zero sends nothing at all. Returns the number of
/// frames written.
pub fn stream_samples<T, S, F>(link: &mut Link<T>, count: usize, mut next: F) -> Result<usize, LinkError>
where
    T: Read + Write,
    S: Sample,
    F: FnMut(usize) -> S,
{
    let per_frame = S::per_frame();
    let mut sent = 0;
    let mut frames = 0;

    while sent < count {
        // The transmit buffer is reused for every frame
        let tx = link.tx_mut();
        let mut filled = 0;
        let mut in_frame = 0;
        while in_frame < per_frame && sent < count {
            Sample::encode(&next(sent), &mut tx[filled..filled + S::ENCODED_LEN]);
            filled += S::ENCODED_LEN;
            in_frame += 1;
            sent += 1;
        }

        link.write_tx(filled, sent < count)?;
        frames += 1;
    }

    trace!("streamed {} samples in {} frames", count, frames);
    Ok(frames)
}
