//! Per-open read/write transactions.
//!
//! A session delivers at most one reading: the first non-empty read of a
//! fresh session returns the encoded value, every later read returns end of
//! stream. While nothing is selected every read returns zero bytes and the
//! session stays fresh.

use crate::config::SamplingMode;
use crate::device::Shared;
use crate::encoder::EncodedReading;
use crate::error::Result;
use crate::sampler;
use crate::selector::Selector;
use log::{debug, trace, warn};
use std::io;
use std::sync::atomic::Ordering;

/// Read cursor of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cursor {
    Fresh,
    Exhausted,
}

/// One open handle on the device. Closing is dropping.
#[derive(Debug)]
pub struct Session<'a> {
    shared: &'a Shared,
    cursor: Cursor,
}

impl<'a> Session<'a> {
    pub(crate) fn new(shared: &'a Shared) -> Self {
        Self {
            shared,
            cursor: Cursor::Fresh,
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Reads the selected group's value as decimal text into `buf`.
    ///
    /// Returns the number of bytes delivered; the text is silently cut to
    /// `buf.len()`. Zero means end of stream or nothing selected.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let key = match self.shared.selector.get() {
            Selector::None => return Ok(0),
            Selector::Group(key) => key,
        };
        if self.cursor == Cursor::Exhausted || buf.is_empty() {
            return Ok(0);
        }

        let reading = match self.shared.config.sampling {
            SamplingMode::Direct => {
                let bits = self.shared.lock_bank().sample_group(key)?;
                EncodedReading::from_bits(key, &bits)
            }
            SamplingMode::Continuous { .. } => self.shared.slot.fetch(key)?,
        };

        let delivered = reading.copy_to(buf);
        self.cursor = Cursor::Exhausted;
        trace!(
            "Read group {} = {} ({} of {} bytes)",
            key,
            reading.text(),
            delivered,
            reading.width()
        );
        Ok(delivered)
    }

    /// Applies a command and re-syncs the indicators.
    ///
    /// The selection is cleared first; only an exact command token selects a
    /// group. In continuous mode the newly selected group is sampled once
    /// before returning. The whole payload is always reported as consumed.
    pub fn write(&mut self, payload: &[u8]) -> Result<usize> {
        let shared = self.shared;
        let mut bank = shared.lock_bank();
        shared.selector.set(Selector::None);
        let selected = Selector::from_command(payload, bank.groups());
        shared.selector.set(selected);
        debug!("Selection is now {:?}", selected);

        let lit = shared.indicator_for(&bank, selected);
        bank.show_indicator(lit)?;

        if let (Selector::Group(key), SamplingMode::Continuous { .. }) =
            (selected, shared.config.sampling)
        {
            // A failure is published for the next read to report.
            if let Err(e) = sampler::refresh(&mut bank, &shared.slot, key) {
                warn!("Sampling group {} after selection failed: {}", key, e);
            }
        }
        Ok(payload.len())
    }

    /// Closes the session, freeing its admission slot.
    pub fn close(self) {}
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.shared.sessions.fetch_sub(1, Ordering::AcqRel);
        debug!("Session closed");
    }
}

impl io::Read for Session<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Session::read(self, buf).map_err(io::Error::from)
    }
}

impl io::Write for Session<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Session::write(self, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
