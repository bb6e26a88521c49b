//! salesnav-harvest - resumable lead harvesting from Sales Navigator searches.
//!
//! Walks every page of a lead search in a live browser, extracts one record per
//! lead card, deduplicates across pages and exports the result as CSV. Progress
//! is persisted before each page change so the harvest survives the reload.

pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod harvest;
pub mod models;
pub mod pacing;
pub mod page;
pub mod store;
pub mod surface;

pub use config::{HarvestConfig, Settings};
pub use error::{HarvestError, Result};
pub use harvest::{CancelHandle, HarvestSummary, Harvester, Phase, RunOutcome};
