//! Pin bank: the sensor groups and indicators, claimed through a [`PinDriver`].

use crate::config::SiscomConfig;
use crate::error::{Error, Result};
use crate::gpio::{PinDirection, PinDriver, PinLevel, PinSpec};
use log::{debug, trace, warn};
use std::fmt;

/// Identifies a sensor group. Key 0 is reserved for "no selection".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey(pub u8);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One pin owned by the bank.
#[derive(Debug, Clone)]
pub struct Pin {
    spec: PinSpec,
    direction: PinDirection,
    level: PinLevel,
    claimed: bool,
}

impl Pin {
    fn new(spec: PinSpec, direction: PinDirection) -> Self {
        Self {
            spec,
            direction,
            level: PinLevel::Low,
            claimed: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &PinSpec {
        &self.spec
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    /// Last sampled (input) or driven (output) level.
    pub fn level(&self) -> PinLevel {
        self.level
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Ordered input pins read together as one value.
#[derive(Debug, Clone)]
pub struct PinGroup {
    key: GroupKey,
    command: String,
    indicator: usize,
    pins: Vec<Pin>,
}

impl PinGroup {
    pub fn key(&self) -> GroupKey {
        self.key
    }

    /// Command token that selects this group.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Index of the indicator lit while this group is selected.
    pub fn indicator(&self) -> usize {
        self.indicator
    }

    pub fn width(&self) -> usize {
        self.pins.len()
    }

    pub fn pins(&self) -> &[Pin] {
        &self.pins
    }
}

/// Owns every pin of the device and the driver behind them.
pub struct PinBank {
    driver: Box<dyn PinDriver>,
    groups: Vec<PinGroup>,
    indicators: Vec<Pin>,
}

impl fmt::Debug for PinBank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinBank")
            .field("groups", &self.groups)
            .field("indicators", &self.indicators)
            .finish_non_exhaustive()
    }
}

impl PinBank {
    /// Builds the bank from a validated configuration. Nothing is claimed yet.
    pub fn new(config: &SiscomConfig, driver: Box<dyn PinDriver>) -> Self {
        let groups = config
            .groups
            .iter()
            .map(|g| PinGroup {
                key: g.key,
                command: g.command.clone(),
                indicator: g.indicator,
                pins: g
                    .pins
                    .iter()
                    .cloned()
                    .map(|spec| Pin::new(spec, PinDirection::Input))
                    .collect(),
            })
            .collect();
        let indicators = config
            .indicators
            .iter()
            .cloned()
            .map(|spec| Pin::new(spec, PinDirection::Output))
            .collect();
        Self {
            driver,
            groups,
            indicators,
        }
    }

    pub fn groups(&self) -> &[PinGroup] {
        &self.groups
    }

    pub fn group(&self, key: GroupKey) -> Option<&PinGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn indicators(&self) -> &[Pin] {
        &self.indicators
    }

    fn group_index(&self, key: GroupKey) -> Result<usize> {
        self.groups
            .iter()
            .position(|g| g.key == key)
            .ok_or_else(|| Error::unavailable(format!("sensor group {}", key), "no such group"))
    }

    // --- Acquire / Release ---
    /// Claims every pin of a group. On failure, pins of this group claimed so
    /// far are released again.
    pub fn acquire_group(&mut self, key: GroupKey) -> Result<()> {
        let idx = self.group_index(key)?;
        debug!("Acquiring sensor group {}", key);
        claim_all(self.driver.as_mut(), &mut self.groups[idx].pins)
    }

    /// Releases every claimed pin of a group. Idempotent.
    pub fn release_group(&mut self, key: GroupKey) {
        if let Some(group) = self.groups.iter_mut().find(|g| g.key == key) {
            debug!("Releasing sensor group {}", key);
            release_all(self.driver.as_mut(), &mut group.pins);
        }
    }

    /// Claims every indicator; same partial-failure rule as [`Self::acquire_group`].
    pub fn acquire_indicators(&mut self) -> Result<()> {
        debug!("Acquiring {} indicators", self.indicators.len());
        claim_all(self.driver.as_mut(), &mut self.indicators)
    }

    /// Switches every claimed indicator off, then releases them. Idempotent.
    pub fn release_indicators(&mut self) {
        debug!("Releasing indicators");
        for index in 0..self.indicators.len() {
            if self.indicators[index].claimed {
                if let Err(e) = self.drive(index, PinLevel::Low) {
                    warn!("Could not switch off '{}': {}", self.indicators[index].name(), e);
                }
            }
        }
        release_all(self.driver.as_mut(), &mut self.indicators);
    }

    // --- Pin I/O ---
    /// Samples every pin of a group once, in index order.
    pub fn sample_group(&mut self, key: GroupKey) -> Result<Vec<bool>> {
        let idx = self.group_index(key)?;
        let driver = self.driver.as_mut();
        let mut bits = Vec::with_capacity(self.groups[idx].pins.len());
        for pin in self.groups[idx].pins.iter_mut() {
            if !pin.claimed {
                return Err(Error::unavailable(pin.name(), "pin is not acquired"));
            }
            let level = driver
                .read_input(pin.spec.line)
                .map_err(|e| Error::unavailable(pin.name(), e))?;
            trace!("Sampled '{}' (line {}): {:?}", pin.name(), pin.spec.line.number(), level);
            pin.level = level;
            bits.push(level.is_high());
        }
        Ok(bits)
    }

    /// Drives one indicator.
    pub fn drive(&mut self, index: usize, level: PinLevel) -> Result<()> {
        let pin = self
            .indicators
            .get_mut(index)
            .ok_or_else(|| Error::unavailable(format!("indicator {}", index), "no such indicator"))?;
        if !pin.claimed {
            return Err(Error::unavailable(pin.name(), "pin is not acquired"));
        }
        trace!("Driving '{}' (line {}) {:?}", pin.spec.name, pin.spec.line.number(), level);
        self.driver
            .set_output(pin.spec.line, level)
            .map_err(|e| Error::unavailable(pin.spec.name.as_str(), e))?;
        pin.level = level;
        Ok(())
    }

    /// Turns every indicator off, then lights `lit` if given.
    pub fn show_indicator(&mut self, lit: Option<usize>) -> Result<()> {
        for index in 0..self.indicators.len() {
            self.drive(index, PinLevel::Low)?;
        }
        if let Some(index) = lit {
            self.drive(index, PinLevel::High)?;
        }
        Ok(())
    }

    /// Index of every indicator currently driven high.
    pub fn lit_indicators(&self) -> Vec<usize> {
        self.indicators
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.level.is_high())
            .map(|(i, _)| i)
            .collect()
    }
}

fn claim_all(driver: &mut dyn PinDriver, pins: &mut [Pin]) -> Result<()> {
    for i in 0..pins.len() {
        if pins[i].claimed {
            continue;
        }
        let (line, direction) = (pins[i].spec.line, pins[i].direction);
        match driver.claim(line, direction) {
            Ok(()) => {
                trace!("Claimed '{}' (line {}) as {:?}", pins[i].name(), line.number(), direction);
                pins[i].claimed = true;
            }
            Err(e) => {
                warn!("Failed to claim '{}' (line {}): {}", pins[i].name(), line.number(), e);
                let name = pins[i].name().to_string();
                release_all(driver, &mut pins[..i]);
                return Err(Error::unavailable(name, e));
            }
        }
    }
    Ok(())
}

fn release_all(driver: &mut dyn PinDriver, pins: &mut [Pin]) {
    for pin in pins.iter_mut().rev().filter(|p| p.claimed) {
        if let Err(e) = driver.release(pin.spec.line) {
            warn!("Error releasing '{}' (line {}): {}", pin.name(), pin.spec.line.number(), e);
        }
        pin.claimed = false;
        pin.level = PinLevel::Low;
        trace!("Released '{}'", pin.name());
    }
}
