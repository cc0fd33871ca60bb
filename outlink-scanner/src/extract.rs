//! Anchor extraction straight from raw HTML text.
//!
//! This is pattern matching, not parsing: malformed markup still yields
//! whatever `href` values can be picked out of it.

use regex::Regex;
use std::sync::LazyLock;

static ANCHOR_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<a\s[^>]*?href\s*=\s*("[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("anchor pattern is valid")
});

/// Pull every anchor `href` out of an HTML body, in document order.
///
/// Surrounding quotes are trimmed and in-page bookmarks (`#...`) are skipped.
pub fn extract_hrefs(html: &str) -> Vec<String> {
    ANCHOR_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .trim_matches('"')
                .trim_matches('\'')
                .trim()
                .replace("&amp;", "&")
        })
        .filter(|href| !href.starts_with('#'))
        .collect()
}
