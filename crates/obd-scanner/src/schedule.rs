//! Polling order

use std::sync::Arc;

use obd_core::Metric;

/// Cycles through a fixed metric list, one step per call
#[derive(Debug, Clone)]
pub struct RoundRobin {
    metrics: Arc<[Metric]>,
    index: usize,
}

impl RoundRobin {
    /// `metrics` must not be empty
    pub fn new(metrics: Arc<[Metric]>) -> Self {
        debug_assert!(!metrics.is_empty());
        Self { metrics, index: 0 }
    }

    /// Metric for this cycle; advances the cursor with wraparound
    pub fn next_metric(&mut self) -> Metric {
        let metric = self.metrics[self.index];
        self.index = (self.index + 1) % self.metrics.len();
        metric
    }

    /// Position of the next metric to be returned
    pub fn position(&self) -> usize {
        self.index
    }
}
