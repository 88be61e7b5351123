// ── Runtime tuning configuration ──
//
// Constructed by the embedding page and handed in -- the core never
// reads config files.

use std::time::Duration;

/// Tuning for the bandwidth estimator.
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Number of samples held in the sliding window. Must be >= 2 for a
    /// rate to ever be published.
    pub window_size: usize,
    /// How often a sample is captured and the readouts refreshed.
    pub tick_period: Duration,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            window_size: 3,
            tick_period: Duration::from_secs(1),
        }
    }
}

/// Tuning for the feed grid.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    /// Prefer the low-resolution sub-stream when creating players.
    pub prefer_low_res: bool,
}
