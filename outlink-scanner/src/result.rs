use crate::link::PageId;
use crate::state::Edges;
use serde::Serialize;
use std::fmt;

/// An internal page that was fetched, with the status it answered.
#[derive(Debug, Clone, Serialize)]
pub struct PageRecord {
    pub url: PageId,
    pub status_code: u16,
    pub links_found: usize,
}

/// An internal page whose fetch failed on every attempt.
#[derive(Debug, Clone, Serialize)]
pub struct FetchFailure {
    pub url: PageId,
    pub attempts: usize,
    pub error: String,
}

/// Outcome of a single unretried request to an external link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Alive(u16),
    Dead(DeadReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum DeadReason {
    Status(u16),
    Transport(String),
}

impl fmt::Display for DeadReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadReason::Status(code) => write!(f, "HTTP {}", code),
            DeadReason::Transport(error) => write!(f, "{}", error),
        }
    }
}

/// An external link whose liveness probe failed.
#[derive(Debug, Clone, Serialize)]
pub struct DeadLink {
    pub url: PageId,
    pub referrer: PageId,
    pub reason: DeadReason,
}

/// Everything a finished crawl run produced.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub edges: Edges,
    pub pages: Vec<PageRecord>,
    pub fetch_failures: Vec<FetchFailure>,
    pub dead_links: Vec<DeadLink>,
    pub pages_claimed: usize,
}

impl CrawlOutcome {
    /// Destinations linked from `source`, in extraction order.
    pub fn outgoing(&self, source: &PageId) -> &[PageId] {
        self.edges.get(source).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}
