//! The harvest pipeline: readiness, lazy loading, extraction, deduplication,
//! pagination, and the state machine that sequences them.

pub mod dedup;
pub mod extract;
pub mod lazy_load;
pub mod orchestrator;
pub mod pagination;
pub mod readiness;

#[cfg(test)]
pub(crate) mod testing;

pub use dedup::{DedupStats, Deduplicator};
pub use extract::extract;
pub use lazy_load::{exhaust, ExhaustReport};
pub use orchestrator::{CancelHandle, HarvestSummary, Harvester, Phase, RunOutcome};
pub use readiness::{await_ready, poll_until_stable, PollOutcome, PollPolicy};
