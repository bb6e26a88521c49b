//! Cross-page deduplication on the person-profile URL.

use std::collections::HashSet;

use tracing::debug;

use crate::models::{Record, PROFILE_URL_COLUMN};

/// Counters kept by the [`Deduplicator`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    pub accepted: usize,
    pub duplicates: usize,
    /// Accepted without a profile URL, so never checked for duplicates.
    pub unkeyed: usize,
}

/// Seen-key set spanning the whole harvest.
///
/// Records without a profile URL are always accepted. That lets URL-less cards
/// accumulate duplicates; it is counted in [`DedupStats::unkeyed`] rather than
/// guessed around with a weaker key.
#[derive(Debug, Clone, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
    order: Vec<String>,
    stats: DedupStats,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from keys persisted in a session, keeping their order.
    pub fn from_keys<I: IntoIterator<Item = String>>(keys: I) -> Self {
        let mut dedup = Self::new();
        for key in keys {
            if !key.is_empty() && dedup.seen.insert(key.clone()) {
                dedup.order.push(key);
            }
        }
        dedup
    }

    /// `true` if the record is new; its key is remembered.
    pub fn accept(&mut self, record: &Record) -> bool {
        let key = record.value(PROFILE_URL_COLUMN);
        if key.is_empty() {
            debug!("Accepting lead without profile URL; cannot deduplicate");
            self.stats.accepted += 1;
            self.stats.unkeyed += 1;
            return true;
        }
        if self.seen.contains(key) {
            debug!("Skipping duplicate lead {}", key);
            self.stats.duplicates += 1;
            return false;
        }
        self.seen.insert(key.to_string());
        self.order.push(key.to_string());
        self.stats.accepted += 1;
        true
    }

    /// Seen keys in first-seen order.
    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn stats(&self) -> DedupStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(name: &str, url: &str) -> Record {
        Record::new()
            .with("Full Name", name)
            .with(PROFILE_URL_COLUMN, url)
    }

    #[test]
    fn test_replay_keeps_first_occurrence_once() {
        let urls = ["u1", "u2", "u1", "u3", "u2", "u2", "u1", "u4"];
        let mut dedup = Deduplicator::new();
        let kept: Vec<&str> = urls
            .iter()
            .filter(|u| dedup.accept(&lead("x", u)))
            .copied()
            .collect();

        assert_eq!(kept, vec!["u1", "u2", "u3", "u4"]);
        assert_eq!(dedup.keys(), &["u1", "u2", "u3", "u4"]);
        assert_eq!(dedup.stats().duplicates, 4);

        // Replaying the whole sequence again retains nothing new.
        assert!(urls.iter().all(|u| !dedup.accept(&lead("x", u))));
    }

    #[test]
    fn test_missing_url_always_accepted() {
        let mut dedup = Deduplicator::new();
        assert!(dedup.accept(&lead("Anon", "")));
        assert!(dedup.accept(&lead("Anon", "")));
        assert!(dedup.accept(&Record::new().with("Full Name", "No column")));
        assert_eq!(dedup.stats().unkeyed, 3);
        assert!(dedup.is_empty());
    }

    #[test]
    fn test_from_keys_restores_state() {
        let mut dedup = Deduplicator::from_keys(vec!["a".to_string(), "b".to_string(), "a".to_string()]);
        assert_eq!(dedup.keys(), &["a", "b"]);
        assert!(!dedup.accept(&lead("x", "b")));
        assert!(dedup.accept(&lead("x", "c")));
        assert_eq!(dedup.len(), 3);
    }
}
