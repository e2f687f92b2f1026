//! The active sensor selection.

use crate::bank::{GroupKey, PinGroup};
use std::sync::atomic::{AtomicU8, Ordering};

/// Which sensor group is active, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selector {
    #[default]
    None,
    Group(GroupKey),
}

impl Selector {
    /// Maps a written payload to a selection. Only an exact, case-sensitive
    /// match against a group's command selects it; anything else is `None`.
    pub fn from_command(payload: &[u8], groups: &[PinGroup]) -> Self {
        groups
            .iter()
            .find(|g| g.command().as_bytes() == payload)
            .map_or(Selector::None, |g| Selector::Group(g.key()))
    }

    pub fn group(self) -> Option<GroupKey> {
        match self {
            Selector::None => None,
            Selector::Group(key) => Some(key),
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            Selector::None => 0,
            Selector::Group(GroupKey(k)) => k,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Selector::None,
            k => Selector::Group(GroupKey(k)),
        }
    }
}

impl From<Option<GroupKey>> for Selector {
    fn from(key: Option<GroupKey>) -> Self {
        key.map_or(Selector::None, Selector::Group)
    }
}

/// Single-writer, multi-reader cell holding the current [`Selector`].
#[derive(Debug, Default)]
pub struct SelectorCell(AtomicU8);

impl SelectorCell {
    pub fn new(initial: Selector) -> Self {
        Self(AtomicU8::new(initial.to_raw()))
    }

    #[inline]
    pub fn get(&self) -> Selector {
        Selector::from_raw(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, value: Selector) {
        self.0.store(value.to_raw(), Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::PinBank;
    use crate::config::SiscomConfig;
    use crate::sim::SimPins;

    fn groups() -> Vec<PinGroup> {
        PinBank::new(&SiscomConfig::default(), Box::new(SimPins::new()))
            .groups()
            .to_vec()
    }

    #[test]
    fn test_exact_match_only() {
        let groups = groups();
        assert_eq!(
            Selector::from_command(b"sensor1", &groups),
            Selector::Group(GroupKey(1))
        );
        assert_eq!(
            Selector::from_command(b"sensor2", &groups),
            Selector::Group(GroupKey(2))
        );
        let unknown: [&[u8]; 6] = [b"sensor", b"sensor12", b"Sensor1", b"sensor1\n", b"", b"sensor3"];
        for payload in unknown {
            assert_eq!(Selector::from_command(payload, &groups), Selector::None);
        }
    }

    #[test]
    fn test_cell_round_trip() {
        let cell = SelectorCell::new(Selector::Group(GroupKey(2)));
        assert_eq!(cell.get(), Selector::Group(GroupKey(2)));
        cell.set(Selector::None);
        assert_eq!(cell.get(), Selector::None);
        assert_eq!(cell.get().group(), None);
        assert_eq!(SelectorCell::default().get(), Selector::None);
    }
}
