//! Simulated backend latency applied before a load settles.

use std::time::Duration;

use rand::Rng;

use crate::io::config::LatencyConfig;

/// Delay policy: a short fixed delay for cache hits and a randomized band
/// for first-time fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyPolicy {
    cached_ms: u64,
    fetch_min_ms: u64,
    fetch_max_ms: u64,
}

impl LatencyPolicy {
    /// Bounds are reordered if `fetch_min_ms > fetch_max_ms`.
    pub fn new(cached_ms: u64, fetch_min_ms: u64, fetch_max_ms: u64) -> Self {
        Self {
            cached_ms,
            fetch_min_ms: fetch_min_ms.min(fetch_max_ms),
            fetch_max_ms: fetch_min_ms.max(fetch_max_ms),
        }
    }

    /// No artificial delay at all.
    pub fn immediate() -> Self {
        Self::new(0, 0, 0)
    }

    pub fn cached(&self) -> Duration {
        Duration::from_millis(self.cached_ms)
    }

    pub fn first_fetch(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.fetch_min_ms..=self.fetch_max_ms);
        Duration::from_millis(ms)
    }
}

impl From<&LatencyConfig> for LatencyPolicy {
    fn from(cfg: &LatencyConfig) -> Self {
        Self::new(cfg.cached_ms, cfg.fetch_min_ms, cfg.fetch_max_ms)
    }
}
