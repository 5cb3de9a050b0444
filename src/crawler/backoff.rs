//! Retry backoff with random jitter

use rand::Rng;
use std::time::Duration;

/// Exponential backoff: `base * 2^attempt`, capped at `max`, plus up to
/// `jitter_percent` of the capped delay chosen at random
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    base_ms: u64,
    max_ms: u64,
    jitter_percent: u64,
}

impl ExponentialBackoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            jitter_percent: 100,
        }
    }

    pub fn with_jitter(mut self, jitter_percent: u64) -> Self {
        self.jitter_percent = jitter_percent;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (0-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponential_delay = self
            .base_ms
            .saturating_mul(2u64.saturating_pow(attempt.min(20)));
        let capped_delay = exponential_delay.min(self.max_ms);
        let jitter_cap = capped_delay.saturating_mul(self.jitter_percent) / 100;
        let jitter = if jitter_cap > 0 {
            rand::rng().random_range(0..=jitter_cap)
        } else {
            0
        };
        Duration::from_millis(capped_delay.saturating_add(jitter))
    }
}

/// Uniformly random delay in `[min_ms, max_ms]`
pub fn jittered_delay(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}
