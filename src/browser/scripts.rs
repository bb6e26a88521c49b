//! JavaScript probes evaluated in the search page.
//!
//! Probes that return structured data serialize it with `JSON.stringify` so the
//! Rust side always receives a string.

/// Elements that indicate rendered lead results.
pub const RECORD_SELECTOR: &str = "li.artdeco-list__item, li[class*=\"search-results\"], \
     [data-x--lead-list-item], [data-anonymize=\"person-name\"]";

/// One element per lead card.
pub const CARD_SELECTOR: &str = "li.artdeco-list__item, li[class*=\"search-results\"], \
     div[data-x-search-result], [class*=\"search-result-\"]";

pub fn record_count() -> String {
    format!(
        "document.querySelectorAll({}).length",
        js_string(RECORD_SELECTOR)
    )
}

/// Defines `__leadContainer()`, returning the scrollable element that holds lead cards.
const FIND_CONTAINER: &str = r#"
const __leadContainer = () => {
  const candidates = document.querySelectorAll('div[class*="scaffold"], div[class*="search-results"]');
  for (const el of candidates) {
    const overflow = window.getComputedStyle(el).overflowY;
    if (overflow !== 'auto' && overflow !== 'scroll') continue;
    if (el.querySelector('[data-anonymize="person-name"]') || el.querySelector('li.artdeco-list__item')) {
      return el;
    }
  }
  return null;
};
"#;

pub fn has_scroll_container() -> String {
    format!("(() => {{ {} return __leadContainer() !== null; }})()", FIND_CONTAINER)
}

pub fn scroll_container_to(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    format!(
        "(() => {{ {} const el = __leadContainer(); \
         if (!el) return false; \
         el.scrollTop = Math.floor(el.scrollHeight * {}); return true; }})()",
        FIND_CONTAINER, fraction
    )
}

pub const SCROLL_DOCUMENT: &str =
    "(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()";

/// Candidate strings per card, in fallback order. Matches `CardSnapshot`.
pub fn cards() -> String {
    format!(
        r#"(() => {{
  const text = (el) => (el ? el.textContent : '');
  const attr = (el, name) => (el ? el.getAttribute(name) || '' : '');
  return JSON.stringify(Array.from(document.querySelectorAll({selector})).map((card) => {{
    try {{
      const nameLink = card.querySelector('a[data-control-name="view_lead_panel_via_search_lead_name"]');
      const nameSpan = nameLink ? nameLink.querySelector('span[data-anonymize="person-name"]') : null;
      const subtitle = card.querySelector('.artdeco-entity-lockup__subtitle');
      const companyLink = subtitle
        ? subtitle.querySelector('a[data-control-name="view_company_via_profile_lockup"]') ||
          subtitle.querySelector('a[data-anonymize="company-name"]')
        : null;
      const metadata = card.querySelector('.artdeco-entity-lockup__metadata[data-anonymize="job-title"]') ||
        card.querySelector('.artdeco-entity-lockup__metadata');
      const badge = card.querySelector('.artdeco-entity-lockup__badge') ||
        card.querySelector('[class*="member-badge"]');
      return {{
        card: {{
          names: [
            text(nameSpan) || text(nameLink),
            text(card.querySelector('.artdeco-entity-lockup__title')),
            text(card.querySelector('[data-anonymize="person-name"]')),
            text(card.querySelector('.name')),
          ],
          profileHrefs: [attr(nameLink, 'href')],
          titles: subtitle ? [text(subtitle.querySelector('span[data-anonymize="title"]'))] : [],
          companies: [text(companyLink)],
          companyHrefs: [attr(companyLink, 'href')],
          subtitles: companyLink ? [] : [text(subtitle)],
          locations: [
            text(card.querySelector('span[data-anonymize="location"]')),
            text(card.querySelector('[data-anonymize="location"]')),
          ],
          tenures: [text(metadata)],
          badges: [text(badge)],
        }},
      }};
    }} catch (e) {{
      return {{ error: String(e && e.message ? e.message : e) }};
    }}
  }}));
}})()"#,
        selector = js_string(CARD_SELECTOR)
    )
}

pub const NEXT_CONTROL: &str = r#"(() => {
  const next = document.querySelector('button[aria-label="Next"]') ||
    document.querySelector('button.artdeco-pagination__button--next') ||
    Array.from(document.querySelectorAll('button')).find((b) => b.textContent.toLowerCase().includes('next'));
  if (!next) return JSON.stringify(null);
  return JSON.stringify({
    disabled: !!next.disabled,
    hasDisabledClass: next.classList.contains('disabled'),
    ariaDisabled: next.getAttribute('aria-disabled'),
  });
})()"#;

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selectors_are_quoted() {
        let script = record_count();
        assert!(script.starts_with("document.querySelectorAll(\"li.artdeco-list__item"));
        assert!(script.contains("[data-anonymize=\\\"person-name\\\"]"));
    }

    #[test]
    fn test_scroll_fraction_is_clamped() {
        assert!(scroll_container_to(0.5).contains("el.scrollHeight * 0.5"));
        assert!(scroll_container_to(3.0).contains("el.scrollHeight * 1)"));
        assert!(scroll_container_to(f64::NAN).contains("el.scrollHeight * 0)"));
    }
}
