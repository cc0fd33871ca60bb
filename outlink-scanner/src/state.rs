//! Shared mutable state of one crawl run.
//!
//! Each structure guards itself with its own lock; none of them is ever
//! locked while another is held.

use crate::link::PageId;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Every page ever claimed for crawling or liveness checking.
#[derive(Default)]
pub struct VisitedSet {
    inner: Mutex<HashSet<PageId>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `page` if absent. Returns true iff this call did the insert,
    /// which makes the caller the sole owner of processing that page.
    pub async fn claim(&self, page: &PageId) -> bool {
        let mut visited = self.inner.lock().await;
        if visited.contains(page) {
            false
        } else {
            visited.insert(page.clone());
            true
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Source page -> every destination it links to, duplicates included.
pub type Edges = HashMap<PageId, Vec<PageId>>;

/// Append-only multimap of link edges.
#[derive(Default)]
pub struct LinkGraph {
    edges: Mutex<Edges>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, source: &PageId, destination: PageId) {
        let mut edges = self.edges.lock().await;
        edges.entry(source.clone()).or_default().push(destination);
    }

    /// Move the recorded edges out. Only called once writers are finished.
    pub async fn take(&self) -> Edges {
        std::mem::take(&mut *self.edges.lock().await)
    }
}

/// Result of charging one claimed page against the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charge {
    Within(usize),
    Exceeded(usize),
}

/// Monotonic count of pages claimed for crawling.
pub struct CrawlBudget {
    claimed: AtomicUsize,
    limit: Option<usize>,
}

impl CrawlBudget {
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            claimed: AtomicUsize::new(0),
            limit,
        }
    }

    /// Count one more claimed page. Abandoned pages still count.
    pub fn charge(&self) -> Charge {
        let count = self.claimed.fetch_add(1, Ordering::SeqCst) + 1;
        match self.limit {
            Some(limit) if count > limit => Charge::Exceeded(count),
            _ => Charge::Within(count),
        }
    }

    pub fn claimed(&self) -> usize {
        self.claimed.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }
}
