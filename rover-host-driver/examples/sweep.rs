// Example usage of rover-host-driver

// Opens the serial device given on the command line, sweeps the pan servo across its range and
// prints the median of each sensor's readings at every angle. The port is expected to already be
// configured (baud rate, raw mode), e.g. with `stty -F /dev/ttyUSB0 115200 raw`.

use std::fs::OpenOptions;

use anyhow::Context;
use rover_host_driver::{RangeFinder, RoverClient};

fn median(readings: &[u16]) -> u16 {
    let mut sorted = readings.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .context("Usage: sweep <serial device>")?;
    let port = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("Failed to open {path}"))?;

    let mut rover = RoverClient::new(port);
    rover.ping().context("Rover did not answer ping")?;
    rover.display_clear()?;
    rover.display_print("Sweeping")?;
    rover.init_sensor(RangeFinder::Sonar)?;
    rover.init_sensor(RangeFinder::Infrared)?;

    let pulse_widths: Vec<u16> = (0..=100).map(|step| 500 + step * 20).collect();
    let groups = rover.scan(&pulse_widths)?;

    println!("pulse_width  infrared  sonar");
    for (pulse_width, group) in pulse_widths.iter().zip(&groups) {
        println!(
            "{:>11}  {:>8}  {:>5}",
            pulse_width,
            median(&group.infrared),
            median(&group.sonar)
        );
    }

    rover.set_servo(1500)?;
    Ok(())
}
