//! Persistence of the harvest session across document reloads.
//!
//! The store is a passive mirror written by the orchestrator before each
//! navigation and read once at entry. Every failure is logged and treated as
//! "no session": a harvest can always fall back to starting fresh.

mod backend;

pub use backend::{FileBackend, MemoryBackend, SessionBackend};

use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};
use crate::models::{now_epoch_ms, HarvestSession};

/// Well-known key the session lives under.
pub const SESSION_KEY: &str = "salesnav_harvest.session";

/// Maximum session age before it is discarded unresumed.
pub const DEFAULT_STALENESS_MS: i64 = 3_600_000;

pub struct SessionStore<B: SessionBackend> {
    backend: B,
    staleness_ms: i64,
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_staleness(backend, DEFAULT_STALENESS_MS)
    }

    pub fn with_staleness(backend: B, staleness_ms: i64) -> Self {
        Self {
            backend,
            staleness_ms,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Persist `session`, stamping it with the current time. Returns whether it was written.
    pub fn save(&self, session: &HarvestSession) -> bool {
        match self.try_save(session) {
            Ok(stamped) => {
                debug!(
                    "Saved session: {} records, {} keys, {} pages",
                    stamped.records.len(),
                    stamped.seen_keys.len(),
                    stamped.pages_completed
                );
                true
            }
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    /// Fallible half of [`SessionStore::save`]; returns the stamped copy written.
    pub fn try_save(&self, session: &HarvestSession) -> Result<HarvestSession> {
        let mut stamped = session.clone();
        stamped.updated_at_epoch_ms = now_epoch_ms();

        let json = serde_json::to_string(&stamped)
            .map_err(|e| HarvestError::Persistence(format!("serialize: {}", e)))?;
        self.backend
            .write(SESSION_KEY, &json)
            .map_err(|e| HarvestError::Persistence(format!("write: {:#}", e)))?;
        Ok(stamped)
    }

    /// The stored session, unless absent, unreadable or stale.
    pub fn load(&self) -> Option<HarvestSession> {
        self.load_at(now_epoch_ms())
    }

    /// [`SessionStore::load`] evaluated at `now_ms`.
    pub fn load_at(&self, now_ms: i64) -> Option<HarvestSession> {
        let json = match self.backend.read(SESSION_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                warn!("{}", HarvestError::Persistence(format!("read: {:#}", e)));
                return None;
            }
        };

        let session: HarvestSession = match serde_json::from_str(&json) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding unreadable harvest session: {}", e);
                self.clear();
                return None;
            }
        };

        if session.is_stale(now_ms, self.staleness_ms) {
            info!(
                "Discarding stale harvest session ({} min old)",
                session.age_ms(now_ms) / 60_000
            );
            self.clear();
            return None;
        }

        Some(session)
    }

    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(SESSION_KEY) {
            warn!("{}", HarvestError::Persistence(format!("clear: {:#}", e)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    struct BrokenBackend;

    impl SessionBackend for BrokenBackend {
        fn read(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Err(anyhow::anyhow!("quota exceeded"))
        }

        fn write(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("quota exceeded"))
        }
    }

    fn sample_session() -> HarvestSession {
        HarvestSession {
            active: true,
            records: vec![
                Record::new()
                    .with("Full Name", "Ada Lovelace")
                    .with("Sales Navigator URL", "https://x/1"),
                Record::new().with("Full Name", "No Url"),
            ],
            seen_keys: vec!["https://x/1".into()],
            pages_completed: 3,
            updated_at_epoch_ms: 0,
            consecutive_empty_pages: 1,
            next_url: Some("https://x/sales/search?page=4".into()),
        }
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let store = SessionStore::new(MemoryBackend::new());
        let session = sample_session();

        let before = now_epoch_ms();
        assert!(store.save(&session));
        let loaded = store.load().unwrap();

        assert_eq!(loaded.records, session.records);
        assert_eq!(loaded.seen_keys, session.seen_keys);
        assert_eq!(loaded.pages_completed, 3);
        assert_eq!(loaded.consecutive_empty_pages, 1);
        assert_eq!(loaded.next_url, session.next_url);
        assert!(loaded.active);
        assert!((loaded.updated_at_epoch_ms - before).abs() < 5_000);
    }

    #[test]
    fn test_stale_session_is_cleared_on_read() {
        let store = SessionStore::new(MemoryBackend::new());
        let mut session = sample_session();
        session.updated_at_epoch_ms = now_epoch_ms() - DEFAULT_STALENESS_MS - 1_000;
        store
            .backend()
            .write(SESSION_KEY, &serde_json::to_string(&session).unwrap())
            .unwrap();

        assert!(store.load().is_none());
        assert_eq!(store.backend().read(SESSION_KEY).unwrap(), None);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_load_at_threshold_boundary() {
        let store = SessionStore::new(MemoryBackend::new());
        store.save(&sample_session());
        let stamped = store.load().unwrap().updated_at_epoch_ms;

        assert!(store.load_at(stamped + DEFAULT_STALENESS_MS).is_some());
        assert!(store.load_at(stamped + DEFAULT_STALENESS_MS + 1).is_none());
    }

    #[test]
    fn test_corrupt_session_is_absent() {
        let store = SessionStore::new(MemoryBackend::new());
        store.backend().write(SESSION_KEY, "{not json").unwrap();
        assert!(store.load().is_none());
        assert_eq!(store.backend().read(SESSION_KEY).unwrap(), None);
    }

    #[test]
    fn test_backend_failures_are_not_fatal() {
        let store = SessionStore::new(BrokenBackend);
        assert!(!store.save(&sample_session()));
        assert!(store.load().is_none());
        store.clear();
    }

    #[test]
    fn test_write_failure_is_a_persistence_error() {
        let store = SessionStore::new(BrokenBackend);
        let err = store.try_save(&sample_session()).unwrap_err();
        assert!(matches!(err, HarvestError::Persistence(_)));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(FileBackend::new(dir.path()));
        store.save(&sample_session());

        let reopened = SessionStore::new(FileBackend::new(dir.path()));
        assert_eq!(reopened.load().unwrap().records.len(), 2);
        reopened.clear();
        assert!(store.load().is_none());
    }
}
