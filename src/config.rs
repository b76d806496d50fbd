//! Pipeline tuning knobs.

use crate::error::{PipelineError, Result};

pub const DEFAULT_WORKERS: usize = 3;

/// Capacity of the distribution channel. Zero makes it a rendezvous channel,
/// so the dispatcher blocks until a worker takes the record.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 0;

/// Fixed settings for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Size of the worker pool.
    pub workers: usize,
    /// Buffered records allowed between dispatcher and workers.
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Checks the settings before any thread is started.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "worker pool size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
