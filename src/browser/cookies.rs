//! Cookie injection so an existing logged-in session is reused.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One cookie as exported by common browser extensions.
///
/// Extensions disagree on naming; `key` is accepted for `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CookieEntry {
    #[serde(alias = "key")]
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: Option<String>,
    pub secure: Option<bool>,
    #[serde(alias = "httpOnly")]
    pub http_only: Option<bool>,
}

impl CookieEntry {
    /// Cookies without a name or domain cannot be set.
    pub fn is_usable(&self) -> bool {
        !self.name.is_empty() && !self.domain.is_empty()
    }
}

/// Parse a JSON cookie export, dropping unusable entries.
pub fn parse_cookies(json: &str) -> Result<Vec<CookieEntry>> {
    let entries: Vec<CookieEntry> =
        serde_json::from_str(json).context("Cookie file is not a JSON array of cookies")?;
    Ok(entries.into_iter().filter(CookieEntry::is_usable).collect())
}

pub fn read_cookies(path: &Path) -> Result<Vec<CookieEntry>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read cookies from {}", path.display()))?;
    parse_cookies(&content)
}

#[cfg(feature = "browser")]
pub(crate) async fn inject(page: &chromiumoxide::Page, cookies: &[CookieEntry]) -> usize {
    use chromiumoxide::cdp::browser_protocol::network::CookieParam;
    use tracing::warn;

    let mut set = 0;
    for cookie in cookies {
        let mut builder = CookieParam::builder()
            .name(cookie.name.clone())
            .value(cookie.value.clone())
            .domain(cookie.domain.clone());
        if let Some(ref path) = cookie.path {
            builder = builder.path(path.clone());
        }
        if let Some(secure) = cookie.secure {
            builder = builder.secure(secure);
        }
        if let Some(http_only) = cookie.http_only {
            builder = builder.http_only(http_only);
        }

        match builder.build() {
            Ok(param) => match page.set_cookie(param).await {
                Ok(_) => set += 1,
                Err(e) => warn!("Failed to set cookie {}: {}", cookie.name, e),
            },
            Err(e) => warn!("Failed to build cookie {}: {}", cookie.name, e),
        }
    }
    set
}
