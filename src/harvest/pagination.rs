//! Pagination: detect a further page and move to it by address.
//!
//! Navigation rewrites the `page` query parameter instead of clicking the
//! "next" control, since click handlers are unreliable while the list
//! re-renders. The control is only consulted to know whether a next page exists.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, info, warn};

use crate::error::{HarvestError, Result};
use crate::page::LeadPage;

static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([?&])page=([^&#]*)").unwrap());

/// Whether an enabled "next" control is rendered.
pub async fn has_next<P: LeadPage + ?Sized>(page: &P) -> bool {
    match page.next_control().await {
        Ok(Some(control)) if control.is_disabled() => {
            info!("Next control is disabled, last page reached");
            false
        }
        Ok(Some(_)) => true,
        Ok(None) => {
            info!("No next control found");
            false
        }
        Err(e) => {
            warn!("Could not inspect next control: {}", e);
            false
        }
    }
}

/// 1-based page number carried by `url`; absent means page 1.
pub fn page_number(url: &str) -> Result<u32> {
    match PAGE_PARAM.captures(url) {
        Some(caps) => parse_page(url, &caps),
        None => Ok(1),
    }
}

fn parse_page(url: &str, caps: &Captures) -> Result<u32> {
    let raw = &caps[2];
    raw.parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| HarvestError::NavigationAmbiguity {
            url: url.to_string(),
            reason: format!("unparseable page parameter {:?}", raw),
        })
}

/// Address of the page after `url`.
///
/// An existing `page` parameter is incremented in place; otherwise `page=2` is
/// appended to the query, before any fragment.
pub fn next_page_url(url: &str) -> Result<String> {
    if let Some(caps) = PAGE_PARAM.captures(url) {
        let current = parse_page(url, &caps)?;
        let following = current
            .checked_add(1)
            .ok_or_else(|| HarvestError::NavigationAmbiguity {
                url: url.to_string(),
                reason: format!("page {} has no successor", current),
            })?;
        let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
        let mut next = String::with_capacity(url.len() + 1);
        next.push_str(&url[..whole.start]);
        next.push_str(&format!("{}page={}", &caps[1], following));
        next.push_str(&url[whole.end..]);
        return Ok(next);
    }

    let (base, fragment) = match url.find('#') {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };
    Ok(format!("{}{}page=2{}", base, separator, fragment))
}

/// Address of the page after the one `page` is showing.
pub async fn next_address<P: LeadPage + ?Sized>(page: &P) -> Result<String> {
    let current = page.current_url().await?;
    debug!("Current URL: {}", current);
    next_page_url(&current)
}

/// Navigate to `next`. The current document does not survive this call.
pub async fn advance<P: LeadPage + ?Sized>(page: &P, next: &str) -> Result<()> {
    info!("Navigating to {}", next);
    page.navigate(next).await?;
    Ok(())
}
