use crate::error::{Result, ScanError};
use crate::link::PageId;
use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENCY: usize = 20;
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable settings for one crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Bare host of the site; it and its `www.` form are internal.
    pub domain: String,
    /// Pages to crawl before newly claimed pages are abandoned. `None` is unlimited.
    pub page_limit: Option<usize>,
    pub max_concurrency: usize,
    pub max_attempts: usize,
    /// Attempt `n` waits `(n - 1) * backoff_unit` before it is sent.
    pub backoff_unit: Duration,
    pub request_timeout: Duration,
    pub check_liveness: bool,
    /// External pages never probed because they are known to block or be gone.
    pub known_dead: HashSet<PageId>,
}

impl CrawlConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            page_limit: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            check_liveness: false,
            known_dead: HashSet::new(),
        }
    }

    /// Zero or negative means unlimited.
    pub fn with_page_limit(mut self, limit: i64) -> Self {
        self.page_limit = usize::try_from(limit).ok().filter(|limit| *limit > 0);
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_liveness_checks(mut self, enabled: bool) -> Self {
        self.check_liveness = enabled;
        self
    }

    pub fn with_known_dead(mut self, known_dead: HashSet<PageId>) -> Self {
        self.known_dead = known_dead;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ScanError::Config("missing domain".to_string()));
        }
        if self.domain.contains("://") || self.domain.contains('/') {
            return Err(ScanError::Config(format!(
                "domain must be a bare host, got '{}'",
                self.domain
            )));
        }
        if self.max_concurrency == 0 {
            return Err(ScanError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ScanError::Config(
                "retry count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
