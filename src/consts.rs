//! Internal constants: board wiring, command tokens and XR2280x register addresses.

use std::time::Duration;

/// Name under which the device node is registered.
pub const DEVICE_NAME: &str = "siscom";

/// Command selecting sensor group 1.
pub const CMD_SENSOR1: &str = "sensor1";
/// Command selecting sensor group 2.
pub const CMD_SENSOR2: &str = "sensor2";

/// Interval between background samples in continuous mode.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

/// Widest group the encoder accepts (value must fit in `u32`).
pub const MAX_GROUP_WIDTH: usize = 31;

// --- Board wiring (BCM line numbers) ---
pub mod board {
    /// Sensor group 1, least significant pin first.
    pub const SENSOR1_LINES: [(u8, &str); 2] = [(10, "BUTTON 1 1"), (11, "BUTTON 1 2")];
    /// Sensor group 2, least significant pin first.
    pub const SENSOR2_LINES: [(u8, &str); 4] = [
        (12, "BUTTON 2 1"),
        (13, "BUTTON 2 2"),
        (19, "BUTTON 2 3"),
        (26, "BUTTON 2 4"),
    ];
    /// Indicators; index 0 is the idle indicator, index k reflects group k.
    pub const INDICATOR_LINES: [(u8, &str); 3] = [(16, "LED 1"), (20, "LED 2"), (21, "LED 3")];
}

// --- XR2280x EDGE interface (USB HID) ---
pub mod hid {
    /// Exar Corporation vendor ID for XR2280x devices.
    pub const EXAR_VID: u16 = 0x04E2;
    /// Product ID for the XR2280x EDGE (GPIO) interface.
    pub const XR2280X_EDGE_PID: u16 = 0x1200; // Common for XR22800/1/2/4

    // Feature Reports (Control Transfer)
    pub const REPORT_ID_WRITE_HID_REGISTER: u8 = 0x3C;
    pub const REPORT_ID_SET_HID_READ_ADDRESS: u8 = 0x4B;
    pub const REPORT_ID_READ_HID_REGISTER: u8 = 0x5A;

    // Group 0 (E0-E15). XR22800/1 only use E0-E7 via HID.
    pub const REG_FUNC_SEL_0: u16 = 0x03C0;
    pub const REG_DIR_0: u16 = 0x03C1;
    pub const REG_SET_0: u16 = 0x03C2;
    pub const REG_CLEAR_0: u16 = 0x03C3;
    pub const REG_STATE_0: u16 = 0x03C4;

    // Group 1 (E16-E31), XR22802/4 only
    pub const REG_FUNC_SEL_1: u16 = 0x03CC;
    pub const REG_DIR_1: u16 = 0x03CD;
    pub const REG_SET_1: u16 = 0x03CE;
    pub const REG_CLEAR_1: u16 = 0x03CF;
    pub const REG_STATE_1: u16 = 0x03D0;
}
