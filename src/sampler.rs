//! Background sampling for continuous mode.
//!
//! One thread samples the selected group every interval and publishes the
//! outcome into a [`ReadingSlot`]. Reads only look at the slot. A write that
//! selects a group publishes a fresh sample for it before returning, so the
//! first read after a selection never sees a value older than the write. The
//! thread sleeps on a condition variable, so cancellation takes effect
//! within one wait.

use crate::bank::{GroupKey, PinBank};
use crate::device::Shared;
use crate::encoder::EncodedReading;
use crate::error::{Error, Result};
use crate::selector::Selector;
use log::{debug, trace, warn};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Latest sampling outcome per group. Writers replace a whole
/// [`EncodedReading`] (or the reason the last sample failed); readers clone
/// one out.
#[derive(Debug, Default)]
pub struct ReadingSlot {
    readings: RwLock<HashMap<GroupKey, std::result::Result<EncodedReading, String>>>,
}

impl ReadingSlot {
    pub fn publish(&self, reading: EncodedReading) {
        let mut readings = self.readings.write().unwrap_or_else(PoisonError::into_inner);
        readings.insert(reading.group(), Ok(reading));
    }

    /// Marks the last sample of `key` as failed. Reads of that group report
    /// the failure until a sample succeeds again.
    pub fn publish_failure(&self, key: GroupKey, reason: impl ToString) {
        let mut readings = self.readings.write().unwrap_or_else(PoisonError::into_inner);
        readings.insert(key, Err(reason.to_string()));
    }

    /// Latest good reading; `None` before the first sample or after a failed one.
    pub fn latest(&self, key: GroupKey) -> Option<EncodedReading> {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);
        readings.get(&key).and_then(|r| r.as_ref().ok()).cloned()
    }

    /// Latest reading, or `ResourceUnavailable` when there is none or the
    /// last sample failed.
    pub fn fetch(&self, key: GroupKey) -> Result<EncodedReading> {
        let readings = self.readings.read().unwrap_or_else(PoisonError::into_inner);
        let resource = || format!("sensor group {}", key);
        match readings.get(&key) {
            Some(Ok(reading)) => Ok(reading.clone()),
            Some(Err(reason)) => Err(Error::unavailable(resource(), reason)),
            None => Err(Error::unavailable(resource(), "no reading published yet")),
        }
    }

    pub fn clear(&self) {
        self.readings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Samples `key` and publishes the outcome, failures included.
pub(crate) fn refresh(bank: &mut PinBank, slot: &ReadingSlot, key: GroupKey) -> Result<()> {
    match bank.sample_group(key) {
        Ok(bits) => {
            let reading = EncodedReading::from_bits(key, &bits);
            trace!("Published group {} = {}", key, reading.text());
            slot.publish(reading);
            Ok(())
        }
        Err(e) => {
            slot.publish_failure(key, &e);
            Err(e)
        }
    }
}

/// Cancellation signal shared by the sampler and the device.
#[derive(Debug, Default)]
pub(crate) struct SamplerSignal {
    cancelled: Mutex<bool>,
    cond: Condvar,
}

impl SamplerSignal {
    fn lock(&self) -> MutexGuard<'_, bool> {
        self.cancelled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    pub(crate) fn cancel(&self) {
        *self.lock() = true;
        self.cond.notify_all();
    }

    fn reset(&self) {
        *self.lock() = false;
    }

    /// Sleeps up to `interval`. Returns `false` once cancelled.
    fn wait(&self, interval: Duration) -> bool {
        let cancelled = self.lock();
        if *cancelled {
            return false;
        }
        let (cancelled, _) = self
            .cond
            .wait_timeout_while(cancelled, interval, |c| !*c)
            .unwrap_or_else(PoisonError::into_inner);
        !*cancelled
    }
}

/// Handle to the running sampler thread.
#[derive(Debug)]
pub(crate) struct Sampler {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl Sampler {
    /// Samples every group once so each has a reading, then spawns the thread.
    pub(crate) fn start(shared: Arc<Shared>, interval: Duration) -> Result<Self> {
        shared.signal.reset();
        shared.slot.clear();
        {
            let mut bank = shared.lock_bank();
            let keys: Vec<GroupKey> = bank.groups().iter().map(|g| g.key()).collect();
            for key in keys {
                refresh(&mut bank, &shared.slot, key)?;
            }
        }

        let worker = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("siscom-sampler".to_string())
            .spawn(move || run(&worker, interval))
            .map_err(|e| Error::unavailable("sampler thread", e))?;
        debug!("Sampler started (interval {:?})", interval);
        Ok(Self {
            shared,
            thread: Some(thread),
        })
    }

    /// Cancels the thread and waits for it to finish. Idempotent.
    pub(crate) fn stop(&mut self) {
        self.shared.signal.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Sampler thread panicked");
            }
            debug!("Sampler stopped");
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: &Shared, interval: Duration) {
    // Start-up already sampled every group; the first tick waits.
    while shared.signal.wait(interval) {
        if let Selector::Group(key) = shared.selector.get() {
            sample_once(shared, key);
        }
    }
    trace!("Sampler loop exited");
}

fn sample_once(shared: &Shared, key: GroupKey) {
    let mut bank = shared.lock_bank();
    // Checked under the bank lock: shutdown cancels before it releases pins.
    if shared.signal.is_cancelled() {
        return;
    }
    if let Err(e) = refresh(&mut bank, &shared.slot, key) {
        warn!("Sampler failed on group {}: {}", key, e);
    }
}
