//! Seams to the live, rendered search page.
//!
//! The harvest logic never touches markup. It talks to a [`LeadPage`] for
//! counts, scrolling, pagination and navigation, and reads each card through
//! a [`RecordLocator`] whose implementation owns every selector fallback.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HarvestError;

/// One card read from the page, or the reason it could not be read.
pub type CardRead<C> = Result<C, HarvestError>;

/// A live document showing a paginated list of lead cards.
#[async_trait]
pub trait LeadPage: Send + Sync {
    type Card: RecordLocator + Send;

    /// Current document address.
    async fn current_url(&self) -> anyhow::Result<String>;

    /// Number of record-bearing elements currently rendered.
    async fn record_count(&self) -> anyhow::Result<usize>;

    /// Whether a scrollable container holding lead cards exists.
    async fn has_scroll_container(&self) -> anyhow::Result<bool>;

    /// Scroll the lead container to `fraction` of its scroll height (0.0 = top).
    async fn scroll_container_to(&self, fraction: f64) -> anyhow::Result<()>;

    /// Scroll the whole document to its end once.
    async fn scroll_document(&self) -> anyhow::Result<()>;

    /// All cards in document order.
    async fn cards(&self) -> anyhow::Result<Vec<CardRead<Self::Card>>>;

    /// The pagination "next" control, if one is rendered.
    async fn next_control(&self) -> anyhow::Result<Option<NextControl>>;

    /// Start a full navigation. The current document is gone afterwards.
    async fn navigate(&self, url: &str) -> anyhow::Result<()>;
}

/// Raw field access for one card. `None` means the field was not found.
pub trait RecordLocator {
    fn full_name(&self) -> Option<String>;
    fn profile_href(&self) -> Option<String>;
    fn job_title(&self) -> Option<String>;
    fn company_name(&self) -> Option<String>;
    fn company_href(&self) -> Option<String>;
    /// Full text of the title/company line, used when no company element exists.
    fn subtitle_text(&self) -> Option<String>;
    fn location(&self) -> Option<String>;
    fn tenure_text(&self) -> Option<String>;
    fn badge_text(&self) -> Option<String>;
}

/// Disabled signals carried by the "next" control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextControl {
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub has_disabled_class: bool,
    #[serde(default)]
    pub aria_disabled: Option<String>,
}

impl NextControl {
    pub fn enabled() -> Self {
        Self::default()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled || self.has_disabled_class || self.aria_disabled.as_deref() == Some("true")
    }
}

/// Candidate strings per field, captured from one card in locator priority order.
///
/// Page adapters fill each list by trying their selectors in order; the first
/// non-blank candidate wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CardSnapshot {
    pub names: Vec<String>,
    pub profile_hrefs: Vec<String>,
    pub titles: Vec<String>,
    pub companies: Vec<String>,
    pub company_hrefs: Vec<String>,
    pub subtitles: Vec<String>,
    pub locations: Vec<String>,
    pub tenures: Vec<String>,
    pub badges: Vec<String>,
}

fn first_present(candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .map(|c| c.trim())
        .find(|c| !c.is_empty())
        .map(str::to_string)
}

impl RecordLocator for CardSnapshot {
    fn full_name(&self) -> Option<String> {
        first_present(&self.names)
    }

    fn profile_href(&self) -> Option<String> {
        first_present(&self.profile_hrefs)
    }

    fn job_title(&self) -> Option<String> {
        first_present(&self.titles)
    }

    fn company_name(&self) -> Option<String> {
        first_present(&self.companies)
    }

    fn company_href(&self) -> Option<String> {
        first_present(&self.company_hrefs)
    }

    // Kept untrimmed inside: the company fallback strips separators itself.
    fn subtitle_text(&self) -> Option<String> {
        self.subtitles
            .iter()
            .find(|s| !s.trim().is_empty())
            .cloned()
    }

    fn location(&self) -> Option<String> {
        first_present(&self.locations)
    }

    fn tenure_text(&self) -> Option<String> {
        first_present(&self.tenures)
    }

    fn badge_text(&self) -> Option<String> {
        first_present(&self.badges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_non_blank_candidate_wins() {
        let card = CardSnapshot {
            names: vec!["".into(), "   ".into(), " Grace Hopper ".into(), "Other".into()],
            ..Default::default()
        };
        assert_eq!(card.full_name().as_deref(), Some("Grace Hopper"));
        assert_eq!(card.location(), None);
    }

    #[test]
    fn test_next_control_disabled_signals() {
        assert!(!NextControl::enabled().is_disabled());
        assert!(NextControl {
            disabled: true,
            ..Default::default()
        }
        .is_disabled());
        assert!(NextControl {
            has_disabled_class: true,
            ..Default::default()
        }
        .is_disabled());
        assert!(NextControl {
            aria_disabled: Some("true".into()),
            ..Default::default()
        }
        .is_disabled());
        assert!(!NextControl {
            aria_disabled: Some("false".into()),
            ..Default::default()
        }
        .is_disabled());
    }

    #[test]
    fn test_snapshot_from_camel_case_json() {
        let json = r#"{"names":["Ada"],"profileHrefs":["/sales/lead/1"],"companyHrefs":[]}"#;
        let card: CardSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(card.full_name().as_deref(), Some("Ada"));
        assert_eq!(card.profile_href().as_deref(), Some("/sales/lead/1"));
        assert_eq!(card.company_href(), None);
    }
}
