//! Lazy-load exhaustion: scroll the lead list until it stops growing.

use tracing::{debug, info, warn};

use crate::config::LazyLoadConfig;
use crate::page::LeadPage;

/// Unchanged measurements in a row that mean the list stopped growing.
const CONVERGENCE_STALLS: usize = 2;

/// What a call to [`exhaust`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExhaustReport {
    /// Scroll/measure cycles performed after the baseline measurement.
    pub cycles: usize,
    pub initial_count: usize,
    pub final_count: usize,
    /// Growth stalled before the attempt ceiling.
    pub converged: bool,
    /// `false` when no lead container was found and the document was scrolled instead.
    pub used_container: bool,
}

/// Trigger scroll-driven loading on the lead container until growth stalls.
///
/// Best-effort: page errors are logged and end the loop early. The container is
/// always scrolled back to the top afterwards.
pub async fn exhaust<P: LeadPage + ?Sized>(page: &P, config: &LazyLoadConfig) -> ExhaustReport {
    let mut report = ExhaustReport::default();

    let has_container = page.has_scroll_container().await.unwrap_or_else(|e| {
        warn!("Could not look up lead container: {}", e);
        false
    });

    if !has_container {
        debug!("No scrollable lead container, scrolling document once");
        if let Err(e) = page.scroll_document().await {
            warn!("Document scroll failed: {}", e);
        }
        config.after_scroll_delay.pause().await;
        return report;
    }
    report.used_container = true;

    let mut previous = match page.record_count().await {
        Ok(count) => count,
        Err(e) => {
            warn!("Could not measure lead count: {}", e);
            return report;
        }
    };
    report.initial_count = previous;
    report.final_count = previous;

    let steps = config.scroll_steps.max(1);
    let mut stalls = 0;

    'attempts: while report.cycles < config.max_attempts {
        report.cycles += 1;

        for step in 1..=steps {
            let fraction = step as f64 / steps as f64;
            if let Err(e) = page.scroll_container_to(fraction).await {
                warn!("Scroll step failed: {}", e);
                break 'attempts;
            }
            if step < steps {
                config.step_delay.pause().await;
            }
        }
        config.after_scroll_delay.pause().await;

        let current = match page.record_count().await {
            Ok(count) => count,
            Err(e) => {
                warn!("Could not measure lead count: {}", e);
                break;
            }
        };
        report.final_count = current;

        if current == previous {
            stalls += 1;
            if stalls >= CONVERGENCE_STALLS {
                report.converged = true;
                break;
            }
        } else {
            debug!("Loaded more leads ({} -> {})", previous, current);
            stalls = 0;
        }
        previous = current;
    }

    if let Err(e) = page.scroll_container_to(0.0).await {
        warn!("Could not restore scroll position: {}", e);
    }
    config.restore_delay.pause().await;

    info!(
        "Lazy loading done after {} cycles ({} -> {} leads{})",
        report.cycles,
        report.initial_count,
        report.final_count,
        if report.converged { "" } else { ", ceiling reached" }
    );
    report
}
