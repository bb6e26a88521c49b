//! Page-readiness detection.
//!
//! There is no "cards rendered" event to wait on, so readiness is approximated
//! by sampling the record count until it is non-zero and unchanged for a
//! number of consecutive polls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ReadinessConfig;
use crate::error::{HarvestError, Result};
use crate::page::LeadPage;

/// Sampling parameters for [`poll_until_stable`].
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Consecutive equal non-zero samples needed.
    pub window: usize,
    pub deadline: Duration,
}

impl From<&ReadinessConfig> for PollPolicy {
    fn from(config: &ReadinessConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            window: config.stability_window,
            deadline: config.deadline(),
        }
    }
}

/// How a poll ended successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Count held steady for the whole window.
    Stable(usize),
    /// Deadline passed with a non-zero but still changing count.
    DeadlineReached(usize),
}

impl PollOutcome {
    pub fn count(&self) -> usize {
        match self {
            PollOutcome::Stable(n) | PollOutcome::DeadlineReached(n) => *n,
        }
    }
}

/// Sample `probe` until its value is non-zero and stable, or the deadline passes.
///
/// Probe errors count as a zero sample. Fails with [`HarvestError::Timeout`]
/// only when the deadline passes and the last sample is zero.
pub async fn poll_until_stable<F, Fut>(mut probe: F, policy: PollPolicy) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<usize>>,
{
    let window = policy.window.max(1);
    let start = Instant::now();
    let mut last: Option<usize> = None;
    let mut streak = 0usize;

    loop {
        let count = match probe().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Record count probe failed: {}", e);
                0
            }
        };

        streak = match (count, last) {
            (0, _) => 0,
            (c, Some(prev)) if c == prev => streak + 1,
            _ => 1,
        };
        last = Some(count);
        debug!("Readiness sample: {} records (streak {}/{})", count, streak, window);

        if streak >= window {
            return Ok(PollOutcome::Stable(count));
        }

        let waited = start.elapsed();
        if waited >= policy.deadline {
            if count > 0 {
                return Ok(PollOutcome::DeadlineReached(count));
            }
            return Err(HarvestError::Timeout { waited });
        }

        tokio::time::sleep(policy.interval).await;
    }
}

/// Wait until the page shows a stable, non-empty set of lead cards.
pub async fn await_ready<P: LeadPage + ?Sized>(
    page: &P,
    config: &ReadinessConfig,
) -> Result<PollOutcome> {
    config.settle.pause().await;

    let outcome = poll_until_stable(|| page.record_count(), PollPolicy::from(config)).await?;
    match outcome {
        PollOutcome::Stable(n) => info!("Page ready with {} lead elements", n),
        PollOutcome::DeadlineReached(n) => {
            warn!("Readiness deadline reached but {} leads found, proceeding anyway", n)
        }
    }
    Ok(outcome)
}
