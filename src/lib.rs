//! # siscom-gpio
//!
//! A sensor-group selection device over GPIO lines. Two groups of digital
//! inputs ("sensors") and a row of digital outputs ("indicators") are served
//! through one byte-stream device:
//!
//! *   Writing `sensor1` or `sensor2` selects a group and lights its indicator.
//!     Anything else disables the selection.
//! *   Reading returns the selected group's pins as a decimal number, first
//!     pin least significant (`"0"` to `"3"` for group 1, `"0"` to `"15"` for
//!     group 2). Each open session delivers one reading, then end of stream.
//!
//! ## Features
//!
//! *   Owned device context ([`Siscom`]) holding the selection, sessions and pins.
//! *   Exclusive or shared sessions ([`SessionPolicy`]); sessions implement
//!     [`std::io::Read`] and [`std::io::Write`].
//! *   Direct sampling on read, or a background sampler thread
//!     ([`SamplingMode::Continuous`]) so reads never touch the hardware.
//! *   Ordered start-up with exact reverse teardown, also on partial failure.
//! *   Pluggable [`PinDriver`] backends:
//!     *   [`sim::SimPins`]: in-memory lines for tests and demos.
//!     *   [`hid::Xr2280xPins`]: EDGE GPIOs of a MaxLinear/Exar XR2280x USB
//!         bridge through `hidapi`.
//! *   OS device-node registration behind the [`DeviceNode`] trait.
//!
//! ## Board Wiring
//!
//! | Group | Command   | Lines (LSB first) | Indicator |
//! |-------|-----------|-------------------|-----------|
//! | -     | (none)    | -                 | LED 1 (line 16), if idle indicator set |
//! | 1     | `sensor1` | 10, 11            | LED 2 (line 20) |
//! | 2     | `sensor2` | 12, 13, 19, 26    | LED 3 (line 21) |
//!
//! ## Basic Usage
//!
//! ```
//! use std::io::{Read, Write};
//! use siscom_gpio::{sim::SimPins, Result, Siscom, SiscomConfig};
//!
//! fn main() -> Result<()> {
//!     let pins = SimPins::new();
//!     let lines = pins.handle();
//!     let device = Siscom::start_detached(SiscomConfig::board(), pins)?;
//!
//!     lines.set_input(13, true);
//!     lines.set_input(26, true);
//!
//!     let mut session = device.open()?;
//!     session.write_all(b"sensor2")?;
//!     let mut text = String::new();
//!     session.read_to_string(&mut text)?;
//!     assert_eq!(text, "10");
//!     assert_eq!(device.lit_indicators(), vec![2]);
//!     Ok(())
//! }
//! ```
//!
//! ## License
//!
//! This project is licensed under the WTFPL.

mod bank;
mod config;
mod consts;
mod device;
mod encoder;
mod error;
pub mod gpio;
pub mod hid;
mod lifecycle;
mod sampler;
mod selector;
mod session;
pub mod sim;

pub use bank::{GroupKey, Pin, PinBank, PinGroup};
pub use config::{GroupSpec, SamplingMode, SessionPolicy, SiscomConfig};
pub use consts::{CMD_SENSOR1, CMD_SENSOR2, DEFAULT_SAMPLE_INTERVAL, DEVICE_NAME};
pub use device::Siscom;
pub use encoder::{encode, to_text, EncodedReading};
pub use error::{Error, Result};
pub use gpio::{PinDirection, PinDriver, PinLevel, PinLine, PinSpec};
pub use lifecycle::{DetachedNode, DeviceNode, Stage};
pub use sampler::ReadingSlot;
pub use selector::{Selector, SelectorCell};
pub use session::{Cursor, Session};

/// Re-exports for the XR2280x backend.
pub mod xr2280x {
    pub use crate::consts::hid::{EXAR_VID, XR2280X_EDGE_PID};
    pub use crate::hid::Xr2280xPins;
}
