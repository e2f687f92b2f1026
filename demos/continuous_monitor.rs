//! Continuous mode: a background sampler keeps the reading fresh while the
//! inputs change, and reads only look at the cached value.

use siscom_gpio::sim::SimPins;
use siscom_gpio::{GroupKey, Result, SamplingMode, Siscom, SiscomConfig};
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    env_logger::init();
    let pins = SimPins::new();
    let lines = pins.handle();
    let config = SiscomConfig::board().with_sampling(SamplingMode::Continuous {
        interval: Duration::from_millis(20),
    });
    let device = Siscom::start_detached(config, pins)?;

    device.open()?.write(b"sensor2")?;

    for step in 0u8..16 {
        let levels: Vec<(u8, bool)> = [12u8, 13, 19, 26]
            .iter()
            .enumerate()
            .map(|(i, &line)| (line, step & (1 << i) != 0))
            .collect();
        lines.set_inputs(&levels);
        thread::sleep(Duration::from_millis(60));

        let mut session = device.open()?;
        let mut buf = [0u8; 8];
        let n = session.read(&mut buf)?;
        println!(
            "inputs {:04b} -> read {:>2} (sampler slot: {:?})",
            step,
            String::from_utf8_lossy(&buf[..n]),
            device.latest_reading(GroupKey(2)).map(|r| r.value())
        );
    }

    println!("Stopping sampler and releasing lines...");
    drop(device);
    println!("Claimed lines after shutdown: {:?}", lines.claimed_lines());
    Ok(())
}
