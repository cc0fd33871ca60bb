//! Page identifiers, link normalization and internal/external classification.

use crate::error::{Result, ScanError};
use serde::{Serialize, Serializer};
use std::fmt;
use url::Url;

/// A normalized absolute URL with its fragment removed.
///
/// Every key of the visited set and the link graph is a `PageId`, so two
/// links that differ only in their `#fragment` collapse to the same page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(Url);

impl PageId {
    /// Parse an absolute URL into a page identifier.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", raw, e)))?;
        Ok(Self::from_url(url))
    }

    pub fn from_url(mut url: Url) -> Self {
        url.set_fragment(None);
        Self(url)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    pub fn url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for PageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// Which side of the site boundary a link falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
}

/// Resolve an `href` found on `referrer` into a page identifier.
///
/// Returns `Ok(None)` for links that point nowhere new (an empty value or a
/// bare bookmark) and for schemes the crawler cannot follow (`mailto:`,
/// `javascript:`, ...). Unparseable values are an error the caller drops.
pub fn normalize(raw: &str, referrer: &PageId) -> Result<Option<PageId>> {
    let raw = raw.trim();
    let without_fragment = raw.split('#').next().unwrap_or_default();
    if without_fragment.is_empty() {
        return Ok(None);
    }

    let resolved = referrer
        .0
        .join(raw)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", raw, e)))?;

    if resolved.scheme() != "http" && resolved.scheme() != "https" {
        return Ok(None);
    }

    Ok(Some(PageId::from_url(resolved)))
}

/// Classify a page against the site domain.
///
/// Only the bare domain and its `www.` form are internal; every other
/// subdomain is external. Comparison is exact string equality on the host.
pub fn classify(page: &PageId, site_domain: &str) -> LinkKind {
    match page.host() {
        None => LinkKind::Internal,
        Some(host) if host == site_domain => LinkKind::Internal,
        Some(host) if host.strip_prefix("www.") == Some(site_domain) => LinkKind::Internal,
        Some(_) => LinkKind::External,
    }
}
