//! Ordered start-up and exact reverse teardown.
//!
//! Every stage that completes is pushed onto a stack. A failing start-up and
//! a regular shutdown both pop that stack, so only what was acquired is
//! released, newest first.

use crate::bank::GroupKey;
use crate::config::SamplingMode;
use crate::device::Shared;
use crate::error::Result;
use crate::sampler::Sampler;
use log::{debug, error, info};
use std::sync::Arc;

/// OS-side registration of the device node (character device, class,
/// permissions). Implementations live outside this crate.
pub trait DeviceNode: Send {
    fn register(&mut self, name: &str) -> Result<()>;
    fn unregister(&mut self);
}

/// A node that registers nothing, for in-process use of the device.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedNode;

impl DeviceNode for DetachedNode {
    fn register(&mut self, name: &str) -> Result<()> {
        debug!("Device '{}' running detached (no OS node)", name);
        Ok(())
    }

    fn unregister(&mut self) {}
}

/// A completed start-up step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    NodeRegistered,
    GroupAcquired(GroupKey),
    IndicatorsAcquired,
    SamplerRunning,
}

pub(crate) struct Lifecycle {
    node: Box<dyn DeviceNode>,
    completed: Vec<Stage>,
    sampler: Option<Sampler>,
    finished: bool,
}

impl std::fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycle")
            .field("completed", &self.completed)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Lifecycle {
    /// Runs every start-up stage. On failure the completed stages are undone
    /// before the originating error is returned.
    pub(crate) fn start(shared: &Arc<Shared>, node: Box<dyn DeviceNode>) -> Result<Self> {
        let mut lifecycle = Self {
            node,
            completed: Vec::new(),
            sampler: None,
            finished: false,
        };
        match lifecycle.run_startup(shared) {
            Ok(()) => {
                info!(
                    "Device '{}' started ({} stages)",
                    shared.config.device_name,
                    lifecycle.completed.len()
                );
                Ok(lifecycle)
            }
            Err(e) => {
                error!(
                    "Start-up of '{}' failed after {:?}: {}",
                    shared.config.device_name, lifecycle.completed, e
                );
                lifecycle.shutdown(shared);
                Err(e)
            }
        }
    }

    fn run_startup(&mut self, shared: &Arc<Shared>) -> Result<()> {
        self.node.register(&shared.config.device_name)?;
        self.completed.push(Stage::NodeRegistered);

        for key in shared.config.groups.iter().map(|g| g.key) {
            shared.lock_bank().acquire_group(key)?;
            self.completed.push(Stage::GroupAcquired(key));
        }

        shared.lock_bank().acquire_indicators()?;
        self.completed.push(Stage::IndicatorsAcquired);
        {
            let mut bank = shared.lock_bank();
            let lit = shared.indicator_for(&bank, shared.selector.get());
            bank.show_indicator(lit)?;
        }

        if let SamplingMode::Continuous { interval } = shared.config.sampling {
            self.sampler = Some(Sampler::start(Arc::clone(shared), interval)?);
            self.completed.push(Stage::SamplerRunning);
        }
        Ok(())
    }

    pub(crate) fn completed(&self) -> &[Stage] {
        &self.completed
    }

    /// Undoes completed stages newest first. Runs once; later calls do nothing.
    pub(crate) fn shutdown(&mut self, shared: &Shared) {
        if self.finished {
            return;
        }
        self.finished = true;
        while let Some(stage) = self.completed.pop() {
            debug!("Undoing {:?}", stage);
            match stage {
                Stage::SamplerRunning => {
                    if let Some(mut sampler) = self.sampler.take() {
                        sampler.stop();
                    }
                }
                Stage::IndicatorsAcquired => shared.lock_bank().release_indicators(),
                Stage::GroupAcquired(key) => shared.lock_bank().release_group(key),
                Stage::NodeRegistered => self.node.unregister(),
            }
        }
        info!("Device '{}' shut down", shared.config.device_name);
    }
}
