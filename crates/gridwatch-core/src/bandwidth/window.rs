// ── Sliding-window sample buffer ──
//
// Fixed-capacity FIFO of (cumulative-bytes, capture-time) samples.
// Samples are non-decreasing in both fields because the byte counter is
// monotonic and ticks never run concurrently.

use std::collections::VecDeque;
use std::time::Instant;

/// One captured data point.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Sample {
    pub bytes: u64,
    pub at: Instant,
}

/// Fixed-capacity FIFO of recent samples; oldest evicted first.
#[derive(Debug)]
pub(crate) struct SampleWindow {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl SampleWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub(crate) fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    pub(crate) fn clear(&mut self) {
        self.samples.clear();
    }

    /// Average rate across the window in MB/s, or `None` until the
    /// window holds at least two samples spanning a positive interval.
    pub(crate) fn rate_mb_per_sec(&self) -> Option<f64> {
        let oldest = self.samples.front()?;
        let newest = self.samples.back()?;
        if self.samples.len() < 2 {
            return None;
        }

        let elapsed = newest.at.duration_since(oldest.at).as_secs_f64();
        if elapsed <= 0.0 {
            return None;
        }

        let bytes_diff = newest.bytes.saturating_sub(oldest.bytes) as f64;
        Some(bytes_diff / (1_000_000.0 * elapsed))
    }
}
