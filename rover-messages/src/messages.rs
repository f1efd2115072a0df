//! Frame payloads, split by direction.

pub mod host_to_rover;
pub mod rover_to_host;
