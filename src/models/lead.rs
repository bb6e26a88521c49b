//! Canonical lead as produced by the extractor.

use super::Record;

/// Column holding the person-profile URL, used as the deduplication key.
pub const PROFILE_URL_COLUMN: &str = "Sales Navigator URL";

/// Canonical column order of an extracted lead.
pub const LEAD_COLUMNS: [&str; 23] = [
    "First Name",
    "Last Name",
    "Full Name",
    "Current Job",
    "Profile Headline",
    "Title",
    "Email",
    "Email Status",
    "Linkedin URL Public",
    PROFILE_URL_COLUMN,
    "Company Name",
    "Company Website",
    "Company Industry",
    "Company LinkedIn URL",
    "Company Sales Navigator URL",
    "Company Location",
    "Company Employee Count",
    "Location",
    "Connections",
    "Years in Position",
    "Months in Position",
    "Years in Company",
    "Months in Company",
];

/// Network distance between the viewer and a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionTier {
    First,
    Second,
    Third,
}

impl ConnectionTier {
    /// Map badge text to a tier by its degree marker.
    pub fn from_badge(text: &str) -> Option<Self> {
        let text = text.to_lowercase();
        if text.contains("1st") {
            Some(Self::First)
        } else if text.contains("2nd") {
            Some(Self::Second)
        } else if text.contains("3rd") {
            Some(Self::Third)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
        }
    }
}

/// Years/months pair parsed from a tenure string. Unmatched parts stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tenure {
    pub years: String,
    pub months: String,
}

/// One lead card, field by field.
///
/// Enrichment columns (email, public profile, company details) have no
/// counterpart on a search card and are always exported empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lead {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub title: String,
    pub profile_url: String,
    pub company_name: String,
    pub company_url: String,
    pub location: String,
    pub connection: Option<ConnectionTier>,
    pub in_role: Tenure,
    pub in_company: Tenure,
}

impl Lead {
    /// A lead is worth keeping only if it carries some name.
    pub fn has_name(&self) -> bool {
        !self.full_name.is_empty() || !self.first_name.is_empty()
    }

    pub fn to_record(&self) -> Record {
        let values: [&str; 23] = [
            &self.first_name,
            &self.last_name,
            &self.full_name,
            &self.title,
            &self.title,
            &self.title,
            "",
            "",
            "",
            &self.profile_url,
            &self.company_name,
            "",
            "",
            "",
            &self.company_url,
            "",
            "",
            &self.location,
            self.connection.map(|c| c.as_str()).unwrap_or_default(),
            &self.in_role.years,
            &self.in_role.months,
            &self.in_company.years,
            &self.in_company.months,
        ];
        LEAD_COLUMNS.iter().copied().zip(values).collect()
    }
}

impl From<Lead> for Record {
    fn from(lead: Lead) -> Self {
        lead.to_record()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_tier_from_badge() {
        assert_eq!(
            ConnectionTier::from_badge("2nd degree connection"),
            Some(ConnectionTier::Second)
        );
        assert_eq!(ConnectionTier::from_badge(" 1ST "), Some(ConnectionTier::First));
        assert_eq!(ConnectionTier::from_badge("3rd+"), Some(ConnectionTier::Third));
        assert_eq!(ConnectionTier::from_badge("Open profile"), None);
    }

    #[test]
    fn test_record_has_every_column() {
        let lead = Lead {
            full_name: "Ada Lovelace".into(),
            first_name: "Ada".into(),
            title: "Analyst".into(),
            ..Default::default()
        };
        let record = lead.to_record();
        assert_eq!(record.keys().collect::<Vec<_>>(), LEAD_COLUMNS.to_vec());
        assert_eq!(record.value("Current Job"), "Analyst");
        assert_eq!(record.value("Profile Headline"), "Analyst");
        assert_eq!(record.value("Title"), "Analyst");
        assert_eq!(record.value("Email"), "");
        assert_eq!(record.value("Connections"), "");
    }
}
