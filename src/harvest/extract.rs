//! Card-to-lead extraction.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::models::{ConnectionTier, Lead, Tenure};
use crate::page::RecordLocator;

/// Base that relative card links are resolved against.
pub const LINKEDIN_BASE: &str = "https://www.linkedin.com";

static IN_ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*years?\s*(?:(\d+)\s*months?)?\s*in\s*role").unwrap()
});

static IN_COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*years?\s*(?:(\d+)\s*months?)?\s*in\s*company").unwrap()
});

static SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*·\s*").unwrap());

/// Map one card to a lead.
///
/// Missing fields come back empty. Returns `None` only when the card yields no
/// data at all; whether a lead is worth keeping is decided by the caller.
pub fn extract<L: RecordLocator + ?Sized>(card: &L) -> Option<Lead> {
    let full_name = card.full_name();
    let profile_href = card.profile_href();
    let title = card.job_title();
    let company_name = card.company_name();
    let company_href = card.company_href();
    let subtitle = card.subtitle_text();
    let location = card.location();
    let tenure = card.tenure_text();
    let badge = card.badge_text();

    let nothing_found = [
        &full_name,
        &profile_href,
        &title,
        &company_name,
        &company_href,
        &subtitle,
        &location,
        &tenure,
        &badge,
    ]
    .iter()
    .all(|f| f.is_none());
    if nothing_found {
        return None;
    }

    let full_name = full_name.unwrap_or_default();
    let (first_name, last_name) = split_name(&full_name);
    let title = title.unwrap_or_default();

    let company_name = match company_name {
        Some(name) => name,
        None => subtitle
            .map(|text| company_from_subtitle(&text, &title))
            .unwrap_or_default(),
    };

    let (in_role, in_company) = tenure.as_deref().map(parse_tenure).unwrap_or_default();

    Some(Lead {
        first_name,
        last_name,
        full_name,
        title,
        profile_url: profile_href.map(|h| absolute_url(&h)).unwrap_or_default(),
        company_name,
        company_url: company_href.map(|h| absolute_url(&h)).unwrap_or_default(),
        location: location.unwrap_or_default(),
        connection: badge.as_deref().and_then(ConnectionTier::from_badge),
        in_role,
        in_company,
    })
}

/// First token is the first name; the remaining tokens form the last name.
pub fn split_name(full_name: &str) -> (String, String) {
    let mut parts = full_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// Recover a company name from the title line when it has no dedicated element.
pub fn company_from_subtitle(subtitle: &str, title: &str) -> String {
    let without_title = if title.is_empty() {
        subtitle.to_string()
    } else {
        subtitle.replacen(title, "", 1)
    };
    SEPARATOR.replace_all(&without_title, "").trim().to_string()
}

/// Parse "`N` year(s) [`M` month(s)] in role | ... in company".
pub fn parse_tenure(text: &str) -> (Tenure, Tenure) {
    (capture_tenure(&IN_ROLE, text), capture_tenure(&IN_COMPANY, text))
}

fn capture_tenure(pattern: &Regex, text: &str) -> Tenure {
    match pattern.captures(text) {
        Some(caps) => Tenure {
            years: caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default(),
            months: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        },
        None => Tenure::default(),
    }
}

/// Resolve a card link against the LinkedIn origin. Absolute links pass through.
pub fn absolute_url(href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }
    Url::parse(LINKEDIN_BASE)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}{}", LINKEDIN_BASE, href))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CardSnapshot;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tenure_role_and_company() {
        let (role, company) = parse_tenure("1 year 11 months in role | 2 years in company");
        assert_eq!(role.years, "1");
        assert_eq!(role.months, "11");
        assert_eq!(company.years, "2");
        assert_eq!(company.months, "");
    }

    #[test]
    fn test_tenure_unmatched_is_empty() {
        let (role, company) = parse_tenure("3 Months In Role");
        assert_eq!(role, Tenure::default());
        assert_eq!(company, Tenure::default());

        let (role, _) = parse_tenure("4 YEARS 2 MONTHS IN ROLE");
        assert_eq!(role.years, "4");
        assert_eq!(role.months, "2");
    }

    #[test]
    fn test_split_name() {
        let (first, last) = split_name("Jean  Claude Van Damme");
        assert_eq!(first, "Jean");
        assert_eq!(last, "Claude Van Damme");

        let (first, last) = split_name("Cher");
        assert_eq!(first, "Cher");
        assert_eq!(last, "");

        assert_eq!(split_name(""), (String::new(), String::new()));
    }

    #[test]
    fn test_company_from_subtitle() {
        assert_eq!(
            company_from_subtitle("Head of Sales · Acme Corp ", "Head of Sales"),
            "Acme Corp"
        );
        assert_eq!(company_from_subtitle(" · Initech", ""), "Initech");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("/sales/lead/ACwAA,NAME_SEARCH"),
            "https://www.linkedin.com/sales/lead/ACwAA,NAME_SEARCH"
        );
        assert_eq!(
            absolute_url("https://www.linkedin.com/sales/company/1"),
            "https://www.linkedin.com/sales/company/1"
        );
    }

    #[test]
    fn test_full_card() {
        let card = CardSnapshot {
            names: strings(&["", "Ada King Lovelace"]),
            profile_hrefs: strings(&["/sales/lead/abc"]),
            titles: strings(&["Analyst"]),
            companies: strings(&["Analytical Engines"]),
            company_hrefs: strings(&["/sales/company/42"]),
            locations: strings(&["London, England"]),
            tenures: strings(&["2 years 3 months in role | 5 years in company"]),
            badges: strings(&["2nd"]),
            ..Default::default()
        };

        let lead = extract(&card).unwrap();
        assert_eq!(lead.first_name, "Ada");
        assert_eq!(lead.last_name, "King Lovelace");
        assert_eq!(lead.profile_url, "https://www.linkedin.com/sales/lead/abc");
        assert_eq!(lead.company_url, "https://www.linkedin.com/sales/company/42");
        assert_eq!(lead.company_name, "Analytical Engines");
        assert_eq!(lead.connection, Some(ConnectionTier::Second));
        assert_eq!(lead.in_role.months, "3");
        assert_eq!(lead.in_company.years, "5");
        assert!(lead.has_name());
    }

    #[test]
    fn test_company_falls_back_to_subtitle_text() {
        let card = CardSnapshot {
            names: strings(&["Bob"]),
            titles: strings(&["CTO"]),
            subtitles: strings(&["CTO · Globex"]),
            ..Default::default()
        };
        let lead = extract(&card).unwrap();
        assert_eq!(lead.company_name, "Globex");
        assert_eq!(lead.company_url, "");
    }

    #[test]
    fn test_partial_card_is_not_an_error() {
        let card = CardSnapshot {
            locations: strings(&["Paris"]),
            ..Default::default()
        };
        let lead = extract(&card).unwrap();
        assert!(!lead.has_name());
        assert_eq!(lead.location, "Paris");
    }

    #[test]
    fn test_empty_card_yields_none() {
        assert!(extract(&CardSnapshot::default()).is_none());
    }
}
