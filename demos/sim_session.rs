//! Walks through the device protocol on simulated lines.
//!
//! Run with `RUST_LOG=debug` to see the lifecycle and selection logging.

use siscom_gpio::sim::SimPins;
use siscom_gpio::{Result, Siscom, SiscomConfig};

fn show(device: &Siscom, command: &str) -> Result<()> {
    let mut session = device.open()?;
    session.write(command.as_bytes())?;
    let mut buf = [0u8; 16];
    let n = session.read(&mut buf)?;
    let text = String::from_utf8_lossy(&buf[..n]);
    println!(
        "write {:<10} -> read {:<6} (lit indicators: {:?})",
        format!("{:?}", command),
        if n == 0 { "<eof>".into() } else { text },
        device.lit_indicators()
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let pins = SimPins::new();
    let lines = pins.handle();

    println!("Starting simulated siscom device...");
    let mut device = Siscom::start_detached(SiscomConfig::board(), pins)?;
    println!("Stages: {:?}\n", device.stages());

    lines.set_inputs(&[(10, true), (11, false)]);
    show(&device, "sensor1")?;

    lines.set_inputs(&[(12, false), (13, true), (19, false), (26, true)]);
    show(&device, "sensor2")?;

    lines.set_inputs(&[(12, true), (13, true), (19, true), (26, true)]);
    show(&device, "sensor2")?;

    show(&device, "sensor3")?;

    // One reading per session.
    let mut session = device.open()?;
    session.write(b"sensor2")?;
    let mut buf = [0u8; 1];
    let first = session.read(&mut buf)?;
    let second = session.read(&mut buf)?;
    println!(
        "\nOne-byte buffer: first read {} byte(s) {:?}, second read {} byte(s)",
        first,
        String::from_utf8_lossy(&buf[..first]),
        second
    );
    drop(session);

    device.shutdown();
    println!("Device shut down, claimed lines: {:?}", lines.claimed_lines());
    Ok(())
}
