//! Device configuration: pin map, indicator policy, sampling and session policy.

use crate::bank::GroupKey;
use crate::consts;
use crate::error::{Error, Result};
use crate::gpio::PinSpec;
use std::collections::HashSet;
use std::time::Duration;

/// One sensor group: its key, the command that selects it, its pins
/// (least significant first) and the indicator that reflects it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub key: GroupKey,
    pub command: String,
    pub pins: Vec<PinSpec>,
    pub indicator: usize,
}

impl GroupSpec {
    pub fn new(key: u8, command: impl Into<String>, pins: Vec<PinSpec>) -> Self {
        Self {
            key: GroupKey(key),
            command: command.into(),
            pins,
            indicator: usize::from(key),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.pins.len()
    }
}

/// How reads obtain their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Reads sample the selected group inline.
    Direct,
    /// A background thread samples every `interval`; reads use the cached value.
    Continuous { interval: Duration },
}

/// How many sessions may be open at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPolicy {
    /// One session at a time; further opens fail with [`Error::Busy`].
    Exclusive,
    /// Any number of sessions.
    Shared,
}

/// Complete configuration of a siscom device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiscomConfig {
    /// Name passed to the device node on registration.
    pub device_name: String,
    /// Sensor groups, acquired in this order at start-up.
    pub groups: Vec<GroupSpec>,
    /// Output pins reflecting the selection.
    pub indicators: Vec<PinSpec>,
    /// Indicator lit while no group is selected; `None` leaves all off.
    pub idle_indicator: Option<usize>,
    /// Selection in effect right after start-up.
    pub initial_selection: Option<GroupKey>,
    pub sampling: SamplingMode,
    pub sessions: SessionPolicy,
}

impl Default for SiscomConfig {
    fn default() -> Self {
        let pins = |lines: &[(u8, &str)]| {
            lines
                .iter()
                .map(|&(line, name)| PinSpec::new(name, line))
                .collect::<Vec<_>>()
        };
        Self {
            device_name: consts::DEVICE_NAME.to_string(),
            groups: vec![
                GroupSpec::new(1, consts::CMD_SENSOR1, pins(&consts::board::SENSOR1_LINES)),
                GroupSpec::new(2, consts::CMD_SENSOR2, pins(&consts::board::SENSOR2_LINES)),
            ],
            indicators: pins(&consts::board::INDICATOR_LINES),
            idle_indicator: None,
            initial_selection: None,
            sampling: SamplingMode::Direct,
            sessions: SessionPolicy::Exclusive,
        }
    }
}

impl SiscomConfig {
    /// Board behaviour: LED 1 lit while nothing is selected.
    pub fn board() -> Self {
        Self::default().with_idle_indicator(Some(0))
    }

    /// Default wiring served by the background sampler.
    pub fn continuous() -> Self {
        Self::default().with_sampling(SamplingMode::Continuous {
            interval: consts::DEFAULT_SAMPLE_INTERVAL,
        })
    }

    pub fn with_idle_indicator(mut self, index: Option<usize>) -> Self {
        self.idle_indicator = index;
        self
    }

    pub fn with_initial_selection(mut self, key: Option<GroupKey>) -> Self {
        self.initial_selection = key;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingMode) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_sessions(mut self, sessions: SessionPolicy) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn group(&self, key: GroupKey) -> Option<&GroupSpec> {
        self.groups.iter().find(|g| g.key == key)
    }

    /// Checks the pin map and policies before any resource is acquired.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.groups.is_empty() {
            return invalid("at least one sensor group is required".to_string());
        }

        let mut keys = HashSet::new();
        let mut commands = HashSet::new();
        let mut lines = HashSet::new();
        for group in &self.groups {
            if group.key.0 == 0 {
                return invalid("group key 0 is reserved for 'no selection'".to_string());
            }
            if !keys.insert(group.key) {
                return invalid(format!("duplicate group key {}", group.key));
            }
            if group.command.is_empty() || !commands.insert(group.command.as_str()) {
                return invalid(format!(
                    "group {} needs a unique, non-empty command (got '{}')",
                    group.key, group.command
                ));
            }
            if group.width() == 0 || group.width() > consts::MAX_GROUP_WIDTH {
                return invalid(format!(
                    "group {} width {} outside 1..={}",
                    group.key,
                    group.width(),
                    consts::MAX_GROUP_WIDTH
                ));
            }
            if group.indicator >= self.indicators.len() {
                return invalid(format!(
                    "group {} maps to indicator {} but only {} are configured",
                    group.key,
                    group.indicator,
                    self.indicators.len()
                ));
            }
        }

        for pin in self.groups.iter().flat_map(|g| g.pins.iter()).chain(&self.indicators) {
            if !lines.insert(pin.line) {
                return invalid(format!(
                    "line {} ('{}') is used more than once",
                    pin.line.number(),
                    pin.name
                ));
            }
        }

        if let Some(idle) = self.idle_indicator {
            if idle >= self.indicators.len() {
                return invalid(format!("idle indicator {} out of range", idle));
            }
        }
        if let Some(key) = self.initial_selection {
            if self.group(key).is_none() {
                return invalid(format!("initial selection names unknown group {}", key));
            }
        }
        if let SamplingMode::Continuous { interval } = self.sampling {
            if interval.is_zero() {
                return invalid("sample interval must be non-zero".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_board_wiring() {
        let config = SiscomConfig::default();
        assert_eq!(config.device_name, "siscom");
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.group(GroupKey(1)).map(GroupSpec::width), Some(2));
        assert_eq!(config.group(GroupKey(2)).map(GroupSpec::width), Some(4));
        assert_eq!(config.indicators.len(), 3);
        assert_eq!(config.idle_indicator, None);
        assert_eq!(config.sampling, SamplingMode::Direct);
        assert_eq!(config.sessions, SessionPolicy::Exclusive);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        assert_eq!(SiscomConfig::board().idle_indicator, Some(0));
        assert!(matches!(
            SiscomConfig::continuous().sampling,
            SamplingMode::Continuous { interval } if interval == consts::DEFAULT_SAMPLE_INTERVAL
        ));
        assert!(SiscomConfig::board().validate().is_ok());
        assert!(SiscomConfig::continuous().validate().is_ok());
    }

    #[test]
    fn test_rejects_wide_group() {
        let mut config = SiscomConfig::default();
        config.groups[0].pins = (0..32).map(|i| PinSpec::new(format!("P{i}"), i)).collect();
        config.indicators.clear();
        config.groups.truncate(1);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_shared_line() {
        let mut config = SiscomConfig::default();
        config.indicators[0].line = config.groups[0].pins[0].line;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_bad_references() {
        let config = SiscomConfig::default().with_idle_indicator(Some(3));
        assert!(config.validate().is_err());

        let config = SiscomConfig::default().with_initial_selection(Some(GroupKey(9)));
        assert!(config.validate().is_err());

        let mut config = SiscomConfig::default();
        config.groups[1].command = consts::CMD_SENSOR1.to_string();
        assert!(config.validate().is_err());

        let config = SiscomConfig::default().with_sampling(SamplingMode::Continuous {
            interval: Duration::ZERO,
        });
        assert!(config.validate().is_err());
    }
}
