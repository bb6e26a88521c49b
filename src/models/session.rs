//! Harvest session: progress that survives a document reload.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::Record;

/// One continuous, possibly multi-reload, harvesting run.
///
/// Serialized as camelCase JSON under a single well-known store key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestSession {
    pub active: bool,
    #[serde(default)]
    pub records: Vec<Record>,
    /// Profile URLs seen so far, in first-seen order.
    #[serde(default)]
    pub seen_keys: Vec<String>,
    #[serde(default)]
    pub pages_completed: u32,
    pub updated_at_epoch_ms: i64,
    #[serde(default)]
    pub consecutive_empty_pages: u32,
    /// Address the last pagination navigated to. Where an interrupted run picks up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_url: Option<String>,
}

impl HarvestSession {
    /// Fresh, active session stamped with the current time.
    pub fn start() -> Self {
        Self {
            active: true,
            updated_at_epoch_ms: now_epoch_ms(),
            ..Default::default()
        }
    }

    pub fn touch(&mut self) {
        self.updated_at_epoch_ms = now_epoch_ms();
    }

    /// Milliseconds since the last update, relative to `now_ms`.
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.updated_at_epoch_ms
    }

    pub fn is_stale(&self, now_ms: i64, threshold_ms: i64) -> bool {
        self.age_ms(now_ms) > threshold_ms
    }

    /// Address to reopen when continuing this session, falling back to `requested`.
    pub fn resume_url<'a>(&'a self, requested: &'a str) -> &'a str {
        match &self.next_url {
            Some(url) if self.active && !url.is_empty() => url,
            _ => requested,
        }
    }
}

pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_field_names() {
        let session = HarvestSession {
            active: true,
            records: vec![Record::new().with("Full Name", "A B")],
            seen_keys: vec!["https://example.com/a".into()],
            pages_completed: 2,
            updated_at_epoch_ms: 1_700_000_000_000,
            consecutive_empty_pages: 0,
            next_url: Some("https://example.com/search?page=3".into()),
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["active"], true);
        assert_eq!(value["seenKeys"][0], "https://example.com/a");
        assert_eq!(value["pagesCompleted"], 2);
        assert_eq!(value["updatedAtEpochMs"], 1_700_000_000_000i64);
        assert_eq!(value["records"][0]["Full Name"], "A B");
        assert_eq!(value["nextUrl"], "https://example.com/search?page=3");
    }

    #[test]
    fn test_missing_empty_page_counter_defaults() {
        let json = r#"{"active":true,"records":[],"seenKeys":[],"pagesCompleted":1,"updatedAtEpochMs":5}"#;
        let session: HarvestSession = serde_json::from_str(json).unwrap();
        assert_eq!(session.consecutive_empty_pages, 0);
        assert_eq!(session.pages_completed, 1);
        assert_eq!(session.next_url, None);
    }

    #[test]
    fn test_resume_url_prefers_saved_target() {
        let requested = "https://example.com/search";
        let mut session = HarvestSession::start();
        assert_eq!(session.resume_url(requested), requested);

        session.next_url = Some("https://example.com/search?page=3".into());
        assert_eq!(
            session.resume_url(requested),
            "https://example.com/search?page=3"
        );

        session.active = false;
        assert_eq!(session.resume_url(requested), requested);
    }

    #[test]
    fn test_staleness() {
        let session = HarvestSession {
            updated_at_epoch_ms: 1_000,
            ..Default::default()
        };
        assert!(!session.is_stale(3_601_000, 3_600_000));
        assert!(session.is_stale(3_601_001, 3_600_000));
    }
}
