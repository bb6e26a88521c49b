//! Domain models.

mod lead;
mod record;
mod session;

pub use lead::{ConnectionTier, Lead, Tenure, LEAD_COLUMNS, PROFILE_URL_COLUMN};
pub use record::Record;
pub use session::{now_epoch_ms, HarvestSession};
