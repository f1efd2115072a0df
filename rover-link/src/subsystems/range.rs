use embedded_io::{Read, Write};
use rover_messages::messages::host_to_rover::DistanceReadingRequest;
use rover_messages::{RangeCommand, SubsystemId};

use super::{RangeSensor, command_code};
use crate::error::LinkError;
use crate::frame::Link;
use crate::stream::stream_samples;

/// Handle a command for either range finder. Both speak the same command set.
pub(crate) fn range_command<T, S>(
    link: &mut Link<T>,
    sensor: &mut S,
    subsystem: SubsystemId,
    code: u8,
) -> Result<(), LinkError>
where
    T: Read + Write,
    S: RangeSensor,
{
    match command_code(subsystem, code)? {
        RangeCommand::Init => {
            debug!("init {}", subsystem);
            sensor.init();
            Ok(())
        }
        RangeCommand::Read => {
            let request: DistanceReadingRequest = link.read_payload()?;
            let count = request.count as usize;
            let frames = if request.raw {
                stream_samples(link, count, |_| sensor.raw_reading())?
            } else {
                stream_samples(link, count, |_| sensor.converted_reading())?
            };
            debug!("{} readings from {} in {} frames", count, subsystem, frames);
            Ok(())
        }
    }
}
