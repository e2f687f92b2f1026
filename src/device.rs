//! The device context: every piece of mutable device state lives here.

use crate::bank::{GroupKey, PinBank};
use crate::config::{SessionPolicy, SiscomConfig};
use crate::encoder::EncodedReading;
use crate::error::{Error, Result};
use crate::gpio::PinDriver;
use crate::lifecycle::{DetachedNode, DeviceNode, Lifecycle, Stage};
use crate::sampler::{ReadingSlot, SamplerSignal};
use crate::selector::{Selector, SelectorCell};
use crate::session::Session;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// State shared by sessions, the lifecycle and the sampler thread.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) config: SiscomConfig,
    pub(crate) bank: Mutex<PinBank>,
    pub(crate) selector: SelectorCell,
    pub(crate) slot: ReadingSlot,
    pub(crate) signal: SamplerSignal,
    pub(crate) sessions: AtomicUsize,
    pub(crate) running: AtomicBool,
}

impl Shared {
    pub(crate) fn lock_bank(&self) -> MutexGuard<'_, PinBank> {
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Indicator that reflects `selector`, if any should be lit.
    pub(crate) fn indicator_for(&self, bank: &PinBank, selector: Selector) -> Option<usize> {
        match selector {
            Selector::None => self.config.idle_indicator,
            Selector::Group(key) => bank.group(key).map(|g| g.indicator()),
        }
    }
}

/// A running siscom device.
///
/// Created by [`Siscom::start`], which acquires the device node and every
/// pin. Dropping the device (or calling [`Siscom::shutdown`]) releases them
/// again in reverse order. Sessions borrow the device, so it cannot be shut
/// down while one is open.
#[derive(Debug)]
pub struct Siscom {
    shared: Arc<Shared>,
    lifecycle: Mutex<Lifecycle>,
}

impl Siscom {
    /// Validates `config`, then registers `node`, claims every pin through
    /// `driver` and starts the sampler if configured.
    pub fn start(
        config: SiscomConfig,
        driver: impl PinDriver + 'static,
        node: impl DeviceNode + 'static,
    ) -> Result<Self> {
        config.validate()?;
        debug!("Starting device '{}' ({:?})", config.device_name, config.sampling);
        let bank = PinBank::new(&config, Box::new(driver));
        let shared = Arc::new(Shared {
            selector: SelectorCell::new(Selector::from(config.initial_selection)),
            bank: Mutex::new(bank),
            slot: ReadingSlot::default(),
            signal: SamplerSignal::default(),
            sessions: AtomicUsize::new(0),
            running: AtomicBool::new(false),
            config,
        });
        let lifecycle = Lifecycle::start(&shared, Box::new(node))?;
        shared.running.store(true, Ordering::Release);
        Ok(Self {
            shared,
            lifecycle: Mutex::new(lifecycle),
        })
    }

    /// Starts the device without an OS device node.
    pub fn start_detached(config: SiscomConfig, driver: impl PinDriver + 'static) -> Result<Self> {
        Self::start(config, driver, DetachedNode)
    }

    /// Opens a session. Under [`SessionPolicy::Exclusive`] a second
    /// concurrent open fails with [`Error::Busy`].
    pub fn open(&self) -> Result<Session<'_>> {
        if !self.is_running() {
            return Err(Error::NotRunning);
        }
        match self.shared.config.sessions {
            SessionPolicy::Exclusive => {
                self.shared
                    .sessions
                    .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Acquire)
                    .map_err(|_| Error::Busy)?;
            }
            SessionPolicy::Shared => {
                self.shared.sessions.fetch_add(1, Ordering::AcqRel);
            }
        }
        debug!("Session opened");
        Ok(Session::new(&self.shared))
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &SiscomConfig {
        &self.shared.config
    }

    pub fn selector(&self) -> Selector {
        self.shared.selector.get()
    }

    /// Number of sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.shared.sessions.load(Ordering::Acquire)
    }

    /// Indices of the indicators currently lit.
    pub fn lit_indicators(&self) -> Vec<usize> {
        self.shared.lock_bank().lit_indicators()
    }

    /// Most recent reading the sampler published for `key` (continuous mode).
    pub fn latest_reading(&self, key: GroupKey) -> Option<EncodedReading> {
        self.shared.slot.latest(key)
    }

    /// Start-up stages still held, oldest first.
    pub fn stages(&self) -> Vec<Stage> {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completed()
            .to_vec()
    }

    /// Stops the sampler and releases every resource in reverse order.
    /// Only the first call has an effect.
    pub fn shutdown(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.lifecycle
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .shutdown(&self.shared);
    }
}

impl Drop for Siscom {
    fn drop(&mut self) {
        self.shutdown();
    }
}
