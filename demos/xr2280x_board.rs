//! Serves the sensor-selection device from the EDGE GPIOs of an XR22802/4.
//!
//! Usage: `cargo run --example xr2280x_board -- [sensor1|sensor2] [reads]`
//!
//! The board wiring uses lines 10-26, so an XR22800/1 (8 GPIOs) is rejected
//! at start-up with an out-of-range error.

use hidapi::HidApi;
use siscom_gpio::xr2280x::Xr2280xPins;
use siscom_gpio::{Result, Siscom, SiscomConfig};
use std::{env, thread, time::Duration};

fn main() -> Result<()> {
    env_logger::init();
    let mut args = env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "sensor1".to_string());
    let reads: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(10);

    let hid_api = HidApi::new()?;
    println!("Opening first XR2280x EDGE interface...");
    let pins = match Xr2280xPins::open_first(&hid_api) {
        Ok(pins) => pins,
        Err(e) => {
            eprintln!("Error opening device: {}", e);
            eprintln!("Ensure device is connected and permissions are set (e.g., udev rules on Linux).");
            return Err(e);
        }
    };
    println!("Device opened ({} GPIOs).", pins.gpio_count());

    let device = Siscom::start_detached(SiscomConfig::board(), pins)?;
    println!("Selecting {:?}; indicator should light.", command);

    for _ in 0..reads {
        let mut session = device.open()?;
        session.write(command.as_bytes())?;
        let mut buf = [0u8; 8];
        let n = session.read(&mut buf)?;
        if n == 0 {
            println!("(no reading: {:?} is not a known command)", command);
        } else {
            println!("{} = {}", command, String::from_utf8_lossy(&buf[..n]));
        }
        thread::sleep(Duration::from_millis(500));
    }
    Ok(())
}
