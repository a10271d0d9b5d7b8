//! Simulation configuration.

use serde::{Deserialize, Serialize};

/// Default number of events between cancellation polls.
pub const DEFAULT_CANCEL_POLL_INTERVAL: u64 = 1024;

/// Knobs for one simulation run.
///
/// Serializable so a run can be reproduced from its recorded
/// configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Master RNG seed; `None` takes one from OS entropy.
    pub seed: Option<u64>,
    /// Worker count for parallel sections.
    pub workers: usize,
    /// Search window for location sampling; `None` scans whole
    /// chromosomes.
    pub chunk_size: Option<usize>,
    /// Events between cancellation polls.
    pub cancel_poll_interval: u64,
}

impl SimulationConfig {
    /// Create a configuration with the given seed and the defaults
    /// everywhere else.
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            seed,
            workers: 1,
            chunk_size: None,
            cancel_poll_interval: DEFAULT_CANCEL_POLL_INTERVAL,
        }
    }

    /// Set the worker count (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the location-sampling window.
    pub fn with_chunk_size(mut self, chunk_size: Option<usize>) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the cancellation poll interval (minimum 1).
    pub fn with_cancel_poll_interval(mut self, interval: u64) -> Self {
        self.cancel_poll_interval = interval.max(1);
        self
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::new(None)
    }
}
