//! Harvest error types.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Readiness deadline passed without a single record on the page.
    #[error("Timed out after {waited:?} waiting for leads to load")]
    Timeout { waited: Duration },

    /// One card could not be read. Never aborts the page.
    #[error("Failed to extract card {index}: {reason}")]
    Extraction { index: usize, reason: String },

    #[error("Session persistence failed: {0}")]
    Persistence(String),

    /// No usable "next" address could be derived from the current one.
    #[error("Cannot determine next page from {url}: {reason}")]
    NavigationAmbiguity { url: String, reason: String },

    #[error("Export failed: {0}")]
    Export(String),

    /// Failure reported by the live page adapter.
    #[error(transparent)]
    Page(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
