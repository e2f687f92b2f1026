//! [`PinDriver`] backed by the EDGE interface of an XR2280x USB bridge.
//!
//! Lines 0-31 map to EDGE pins E0-E31. XR22800/1 only expose E0-E7 through
//! HID; the supported count is detected on open by probing the group 1
//! registers.

use crate::consts::hid as regs;
use crate::error::{Error, Result};
use crate::gpio::{PinDirection, PinDriver, PinLevel, PinLine};
use hidapi::{HidApi, HidDevice};
use log::{debug, trace, warn};
use std::collections::HashSet;
use std::ffi::CStr;

/// GPIO lines of one XR2280x device.
pub struct Xr2280xPins {
    device: HidDevice,
    gpio_count: u8,
    claimed: HashSet<u8>,
}

impl std::fmt::Debug for Xr2280xPins {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Xr2280xPins")
            .field("gpio_count", &self.gpio_count)
            .field("claimed", &self.claimed)
            .finish_non_exhaustive()
    }
}

impl Xr2280xPins {
    /// Opens the first EDGE interface with the default Exar VID/PID.
    /// **Warning:** Ambiguous if multiple devices exist.
    pub fn open_first(hid_api: &HidApi) -> Result<Self> {
        Self::from_device(hid_api.open(regs::EXAR_VID, regs::XR2280X_EDGE_PID)?)
    }

    /// Opens an EDGE interface by its platform-specific path.
    pub fn open_by_path(hid_api: &HidApi, path: &CStr) -> Result<Self> {
        Self::from_device(hid_api.open_path(path)?)
    }

    fn from_device(device: HidDevice) -> Result<Self> {
        let mut pins = Self {
            device,
            gpio_count: 8,
            claimed: HashSet::new(),
        };
        pins.gpio_count = match pins.read_hid_register(regs::REG_FUNC_SEL_1) {
            Ok(_) => {
                debug!("Detected support for 32 GPIOs");
                32
            }
            Err(Error::FeatureReportError { .. }) => {
                debug!("Detected support for 8 GPIOs");
                8
            }
            Err(e) => {
                warn!("Error during capability detection: {}", e);
                return Err(e);
            }
        };
        Ok(pins)
    }

    /// Number of lines reachable through this interface (8 or 32).
    pub fn gpio_count(&self) -> u8 {
        self.gpio_count
    }

    // --- Register Access ---
    fn write_hid_register(&self, reg_addr: u16, value: u16) -> Result<()> {
        let [addr_lo, addr_hi] = reg_addr.to_le_bytes();
        let [val_lo, val_hi] = value.to_le_bytes();
        let buf = [regs::REPORT_ID_WRITE_HID_REGISTER, addr_lo, addr_hi, val_lo, val_hi];
        trace!(
            "Writing Feature Report (Write Reg {:04X} = {:04X}): {:02X?}",
            reg_addr,
            value,
            &buf[..]
        );
        self.device.send_feature_report(&buf).map_err(|e| {
            trace!("send_feature_report error: {}", e);
            Error::FeatureReportError { reg_addr }
        })
    }

    fn read_hid_register(&self, reg_addr: u16) -> Result<u16> {
        let [addr_lo, addr_hi] = reg_addr.to_le_bytes();
        self.device
            .send_feature_report(&[regs::REPORT_ID_SET_HID_READ_ADDRESS, addr_lo, addr_hi])
            .map_err(|e| {
                trace!("send_feature_report error: {}", e);
                Error::FeatureReportError { reg_addr: 0xFFFF }
            })?;

        let mut buf = [regs::REPORT_ID_READ_HID_REGISTER, 0, 0];
        match self.device.get_feature_report(&mut buf) {
            Ok(len) if len == buf.len() && buf[0] == regs::REPORT_ID_READ_HID_REGISTER => {
                let value = u16::from_le_bytes([buf[1], buf[2]]);
                trace!("Read Reg 0x{:04X} = 0x{:04X}", reg_addr, value);
                Ok(value)
            }
            Ok(len) => {
                warn!(
                    "get_feature_report returned unexpected report (len {}, id {:02X})",
                    len, buf[0]
                );
                Err(Error::FeatureReportError { reg_addr })
            }
            Err(e) => {
                trace!("get_feature_report error: {}", e);
                Err(Error::FeatureReportError { reg_addr })
            }
        }
    }

    fn update_register(&self, reg_addr: u16, mask: u16, set: bool) -> Result<()> {
        let current = self.read_hid_register(reg_addr)?;
        let new = if set { current | mask } else { current & !mask };
        if new != current {
            self.write_hid_register(reg_addr, new)?;
        }
        Ok(())
    }

    /// Whether `line` is currently assigned to the EDGE GPIO function.
    pub fn is_edge_assigned(&self, line: PinLine) -> Result<bool> {
        self.check_line(line)?;
        let (reg, mask) = Self::reg_and_mask(line, regs::REG_FUNC_SEL_0, regs::REG_FUNC_SEL_1);
        Ok(self.read_hid_register(reg)? & mask != 0)
    }

    // --- Line helpers ---
    fn check_line(&self, line: PinLine) -> Result<()> {
        if line.number() >= self.gpio_count {
            Err(Error::PinArgumentOutOfRange {
                line: line.number(),
                message: format!("this device exposes lines 0-{}", self.gpio_count - 1),
            })
        } else {
            Ok(())
        }
    }

    /// Picks the group 0 or group 1 register and the bit mask for a line.
    #[inline]
    fn reg_and_mask(line: PinLine, reg0: u16, reg1: u16) -> (u16, u16) {
        let n = line.number();
        let reg = if n < 16 { reg0 } else { reg1 };
        (reg, 1u16 << (n % 16))
    }
}

impl PinDriver for Xr2280xPins {
    fn claim(&mut self, line: PinLine, direction: PinDirection) -> Result<()> {
        self.check_line(line)?;
        if self.claimed.contains(&line.number()) {
            return Err(Error::unavailable(
                format!("line {}", line.number()),
                "line already claimed",
            ));
        }
        let (func_reg, mask) = Self::reg_and_mask(line, regs::REG_FUNC_SEL_0, regs::REG_FUNC_SEL_1);
        let (dir_reg, _) = Self::reg_and_mask(line, regs::REG_DIR_0, regs::REG_DIR_1);
        debug!("Assigning E{} to EDGE as {:?}", line.number(), direction);
        self.update_register(func_reg, mask, true)?;
        if let Err(e) = self.update_register(dir_reg, mask, direction == PinDirection::Output) {
            // Hand the line back to its previous function.
            if let Err(undo) = self.update_register(func_reg, mask, false) {
                warn!("Failed to unassign E{} after claim error: {}", line.number(), undo);
            }
            return Err(e);
        }
        self.claimed.insert(line.number());
        Ok(())
    }

    fn release(&mut self, line: PinLine) -> Result<()> {
        if !self.claimed.remove(&line.number()) {
            return Ok(());
        }
        // Back to a high-impedance input so nothing keeps being driven,
        // then out of the EDGE function.
        let (dir_reg, mask) = Self::reg_and_mask(line, regs::REG_DIR_0, regs::REG_DIR_1);
        let (func_reg, _) = Self::reg_and_mask(line, regs::REG_FUNC_SEL_0, regs::REG_FUNC_SEL_1);
        debug!("Returning E{} to input and unassigning it", line.number());
        let dir = self.update_register(dir_reg, mask, false);
        let func = self.update_register(func_reg, mask, false);
        dir.and(func)
    }

    fn read_input(&mut self, line: PinLine) -> Result<PinLevel> {
        self.check_line(line)?;
        let (reg, mask) = Self::reg_and_mask(line, regs::REG_STATE_0, regs::REG_STATE_1);
        let value = self.read_hid_register(reg)?;
        Ok(PinLevel::from(value & mask != 0))
    }

    fn set_output(&mut self, line: PinLine, level: PinLevel) -> Result<()> {
        self.check_line(line)?;
        let (reg, mask) = match level {
            PinLevel::High => Self::reg_and_mask(line, regs::REG_SET_0, regs::REG_SET_1),
            PinLevel::Low => Self::reg_and_mask(line, regs::REG_CLEAR_0, regs::REG_CLEAR_1),
        };
        trace!(
            "Setting E{} {:?} (writing 0x{:04X} to reg 0x{:04X})",
            line.number(),
            level,
            mask,
            reg
        );
        self.write_hid_register(reg, mask)
    }
}
