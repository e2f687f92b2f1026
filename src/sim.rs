//! In-memory [`PinDriver`] for tests and demos.
//!
//! [`SimPins`] is the driver handed to the device; [`SimHandle`] is a cheap
//! clone that stays with the caller to flip inputs, inspect outputs and
//! inject failures.

use crate::error::{Error, Result};
use crate::gpio::{PinDirection, PinDriver, PinLevel, PinLine};
use log::trace;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Something the simulated hardware observed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    Claimed(u8, PinDirection),
    Released(u8),
    Sampled(u8),
    Driven(u8, PinLevel),
}

#[derive(Debug, Default)]
struct SimState {
    claimed: HashMap<u8, PinDirection>,
    inputs: HashMap<u8, bool>,
    outputs: HashMap<u8, bool>,
    held_elsewhere: HashSet<u8>,
    absent: HashSet<u8>,
    failing_reads: HashSet<u8>,
    releases: HashMap<u8, usize>,
    samples: HashMap<u8, usize>,
    events: Vec<SimEvent>,
}

/// Simulated GPIO lines. Every line number is present unless removed.
#[derive(Debug, Default)]
pub struct SimPins {
    state: Arc<Mutex<SimState>>,
}

/// Test-side view of a [`SimPins`] instance.
#[derive(Debug, Clone)]
pub struct SimHandle {
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    // A panicking test thread must not hide the state from the others.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SimPins {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> SimHandle {
        SimHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl PinDriver for SimPins {
    fn claim(&mut self, line: PinLine, direction: PinDirection) -> Result<()> {
        let mut state = lock(&self.state);
        let n = line.number();
        if state.absent.contains(&n) {
            return Err(Error::unavailable(format!("line {}", n), "line not present"));
        }
        if state.held_elsewhere.contains(&n) || state.claimed.contains_key(&n) {
            return Err(Error::unavailable(format!("line {}", n), "line already claimed"));
        }
        state.claimed.insert(n, direction);
        state.events.push(SimEvent::Claimed(n, direction));
        trace!("sim: claimed line {} as {:?}", n, direction);
        Ok(())
    }

    fn release(&mut self, line: PinLine) -> Result<()> {
        let mut state = lock(&self.state);
        let n = line.number();
        if state.claimed.remove(&n).is_some() {
            *state.releases.entry(n).or_default() += 1;
            state.events.push(SimEvent::Released(n));
        }
        Ok(())
    }

    fn read_input(&mut self, line: PinLine) -> Result<PinLevel> {
        let mut state = lock(&self.state);
        let n = line.number();
        if state.claimed.get(&n) != Some(&PinDirection::Input) {
            return Err(Error::unavailable(format!("line {}", n), "not claimed as input"));
        }
        if state.failing_reads.contains(&n) {
            return Err(Error::unavailable(format!("line {}", n), "sample failed"));
        }
        *state.samples.entry(n).or_default() += 1;
        state.events.push(SimEvent::Sampled(n));
        Ok(PinLevel::from(state.inputs.get(&n).copied().unwrap_or(false)))
    }

    fn set_output(&mut self, line: PinLine, level: PinLevel) -> Result<()> {
        let mut state = lock(&self.state);
        let n = line.number();
        if state.claimed.get(&n) != Some(&PinDirection::Output) {
            return Err(Error::unavailable(format!("line {}", n), "not claimed as output"));
        }
        state.outputs.insert(n, level.is_high());
        state.events.push(SimEvent::Driven(n, level));
        Ok(())
    }
}

impl SimHandle {
    /// Sets the level an input line will report.
    pub fn set_input(&self, line: u8, high: bool) {
        lock(&self.state).inputs.insert(line, high);
    }

    /// Sets several input lines at once, under a single lock.
    pub fn set_inputs(&self, levels: &[(u8, bool)]) {
        let mut state = lock(&self.state);
        for &(line, high) in levels {
            state.inputs.insert(line, high);
        }
    }

    /// Last level driven on an output line (low if never driven).
    pub fn output(&self, line: u8) -> bool {
        lock(&self.state).outputs.get(&line).copied().unwrap_or(false)
    }

    pub fn is_claimed(&self, line: u8) -> bool {
        lock(&self.state).claimed.contains_key(&line)
    }

    pub fn claimed_lines(&self) -> Vec<u8> {
        let mut lines: Vec<u8> = lock(&self.state).claimed.keys().copied().collect();
        lines.sort_unstable();
        lines
    }

    /// Makes the line look owned by another consumer.
    pub fn hold_elsewhere(&self, line: u8) {
        lock(&self.state).held_elsewhere.insert(line);
    }

    pub fn stop_holding(&self, line: u8) {
        lock(&self.state).held_elsewhere.remove(&line);
    }

    /// A driver over the same simulated lines, e.g. for a restart.
    pub fn pins(&self) -> SimPins {
        SimPins {
            state: Arc::clone(&self.state),
        }
    }

    /// Makes the line look physically absent.
    pub fn remove_line(&self, line: u8) {
        lock(&self.state).absent.insert(line);
    }

    pub fn fail_reads(&self, line: u8, fail: bool) {
        let mut state = lock(&self.state);
        if fail {
            state.failing_reads.insert(line);
        } else {
            state.failing_reads.remove(&line);
        }
    }

    pub fn release_count(&self, line: u8) -> usize {
        lock(&self.state).releases.get(&line).copied().unwrap_or(0)
    }

    pub fn sample_count(&self, line: u8) -> usize {
        lock(&self.state).samples.get(&line).copied().unwrap_or(0)
    }

    pub fn events(&self) -> Vec<SimEvent> {
        lock(&self.state).events.clone()
    }

    pub fn clear_events(&self) {
        lock(&self.state).events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_conflicts() {
        let mut sim = SimPins::new();
        let handle = sim.handle();
        sim.claim(PinLine(5), PinDirection::Input).unwrap();
        assert!(sim.claim(PinLine(5), PinDirection::Output).is_err());

        handle.remove_line(6);
        assert!(sim.claim(PinLine(6), PinDirection::Input).is_err());

        sim.release(PinLine(5)).unwrap();
        sim.release(PinLine(5)).unwrap();
        assert_eq!(handle.release_count(5), 1);
        assert!(handle.claimed_lines().is_empty());
    }

    #[test]
    fn test_direction_is_enforced() {
        let mut sim = SimPins::new();
        let handle = sim.handle();
        sim.claim(PinLine(1), PinDirection::Output).unwrap();
        assert!(sim.read_input(PinLine(1)).is_err());
        sim.set_output(PinLine(1), PinLevel::High).unwrap();
        assert!(handle.output(1));

        sim.claim(PinLine(2), PinDirection::Input).unwrap();
        handle.set_input(2, true);
        assert_eq!(sim.read_input(PinLine(2)).unwrap(), PinLevel::High);
        assert!(sim.set_output(PinLine(2), PinLevel::Low).is_err());
    }
}
