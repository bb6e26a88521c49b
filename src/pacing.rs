//! Randomized pacing between automated page actions.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Inclusive range of milliseconds to wait. `min == max` is a fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange::fixed(0);

    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub const fn fixed(ms: u64) -> Self {
        Self {
            min_ms: ms,
            max_ms: ms,
        }
    }

    /// Draw one duration from the range. A reversed range is treated as fixed at `min_ms`.
    pub fn sample(&self) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::rng().random_range(self.min_ms..=self.max_ms))
    }

    /// Sleep for a sampled duration.
    pub async fn pause(&self) {
        let wait = self.sample();
        if wait.is_zero() {
            return;
        }
        trace!("Pausing for {:?}", wait);
        tokio::time::sleep(wait).await;
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_stays_in_range() {
        let range = DelayRange::new(100, 250);
        for _ in 0..200 {
            let d = range.sample();
            assert!(d >= Duration::from_millis(100));
            assert!(d <= Duration::from_millis(250));
        }
    }

    #[test]
    fn test_fixed_and_reversed() {
        assert_eq!(DelayRange::fixed(40).sample(), Duration::from_millis(40));
        assert_eq!(DelayRange::new(90, 10).sample(), Duration::from_millis(90));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_advances_clock() {
        let start = tokio::time::Instant::now();
        DelayRange::fixed(1_500).pause().await;
        assert!(start.elapsed() >= Duration::from_millis(1_500));
    }
}
