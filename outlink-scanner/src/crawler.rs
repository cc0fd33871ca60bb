use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use crate::extract::extract_hrefs;
use crate::fetch::Fetcher;
use crate::gate::Gate;
use crate::link::{LinkKind, PageId, classify, normalize};
use crate::result::{CrawlOutcome, DeadLink, FetchFailure, Liveness, PageRecord};
use crate::state::{Charge, CrawlBudget, LinkGraph, VisitedSet};
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Called with the running page count and the URL each time a page is crawled.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Recursive same-domain crawler.
///
/// Every newly claimed internal page gets its own task; the gate, not the
/// spawn, bounds how much network I/O runs at once.
pub struct Crawler {
    config: Arc<CrawlConfig>,
    progress_callback: Option<ProgressCallback>,
}

/// State owned jointly by every task of a single crawl run.
struct CrawlContext {
    config: Arc<CrawlConfig>,
    fetcher: Fetcher,
    gate: Gate,
    visited: VisitedSet,
    graph: LinkGraph,
    budget: CrawlBudget,
    pages: Mutex<Vec<PageRecord>>,
    fetch_failures: Mutex<Vec<FetchFailure>>,
    dead_links: Mutex<Vec<DeadLink>>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Crawl everything reachable from `start_url` and return the link graph.
    ///
    /// Returns once every spawned page and probe task has finished. Each run
    /// starts from an empty visited set and graph.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlOutcome> {
        let start = PageId::parse(start_url)?;
        let context = Arc::new(CrawlContext {
            config: self.config.clone(),
            fetcher: Fetcher::new(&self.config)?,
            gate: Gate::new(self.config.max_concurrency),
            visited: VisitedSet::new(),
            graph: LinkGraph::new(),
            budget: CrawlBudget::new(self.config.page_limit),
            pages: Mutex::new(Vec::new()),
            fetch_failures: Mutex::new(Vec::new()),
            dead_links: Mutex::new(Vec::new()),
            progress_callback: self.progress_callback.clone(),
        });
        info!(
            url = %start,
            domain = %self.config.domain,
            concurrency = context.gate.capacity(),
            "Starting crawl"
        );

        if let Some(count) = context.admit(&start).await {
            tokio::spawn(context.clone().visit(start, count))
                .await
                .map_err(ScanError::from)?;
        }

        let outcome = CrawlOutcome {
            edges: context.graph.take().await,
            pages: std::mem::take(&mut *context.pages.lock().await),
            fetch_failures: std::mem::take(&mut *context.fetch_failures.lock().await),
            dead_links: std::mem::take(&mut *context.dead_links.lock().await),
            pages_claimed: context.budget.claimed(),
        };

        info!(
            pages = outcome.pages.len(),
            failures = outcome.fetch_failures.len(),
            edges = outcome.edge_count(),
            visited = context.visited.len().await,
            "Crawl complete"
        );
        Ok(outcome)
    }
}

impl CrawlContext {
    /// Claim a page and charge it to the budget. Only admitted pages get a
    /// task, so live page tasks never outnumber distinct in-budget urls.
    async fn admit(&self, page: &PageId) -> Option<usize> {
        if !self.visited.claim(page).await {
            debug!(url = %page, "Skipping already visited url");
            return None;
        }

        match self.budget.charge() {
            Charge::Within(count) => Some(count),
            Charge::Exceeded(count) => {
                debug!(url = %page, count, "Crawl limit reached, abandoning url");
                None
            }
        }
    }

    /// Visit one admitted page and wait for the whole subtree it spawns.
    fn visit(self: Arc<Self>, page: PageId, count: usize) -> BoxFuture<'static, ()> {
        async move {
            info!(count, limit = ?self.budget.limit(), url = %page, "Crawling");
            if let Some(ref callback) = self.progress_callback {
                callback(count, page.to_string());
            }

            let fetched = match self.fetcher.fetch(&self.gate, &page).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    error!(url = %page, error = %e, "Error while fetching body");
                    self.record_failure(page.clone(), e).await;
                    return;
                }
            };

            // Redirected off-site: the body belongs to another domain.
            let hrefs = match classify(&fetched.final_url, &self.config.domain) {
                LinkKind::Internal => extract_hrefs(&fetched.body),
                LinkKind::External => {
                    debug!(url = %page, landed = %fetched.final_url, "Redirected off-site, not scanning");
                    Vec::new()
                }
            };
            debug!(url = %page, count = hrefs.len(), "Found urls");
            self.pages.lock().await.push(PageRecord {
                url: page.clone(),
                status_code: fetched.status_code,
                links_found: hrefs.len(),
            });

            let mut children: Vec<JoinHandle<()>> = Vec::new();
            for href in hrefs {
                let destination = match normalize(&href, &fetched.final_url) {
                    Ok(Some(destination)) => destination,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(source = %page, href = %href, error = %e, "Dropping unparseable link");
                        continue;
                    }
                };

                self.graph.record(&page, destination.clone()).await;

                match classify(&destination, &self.config.domain) {
                    LinkKind::Internal => {
                        if let Some(count) = self.admit(&destination).await {
                            children.push(tokio::spawn(self.clone().visit(destination, count)));
                        }
                    }
                    LinkKind::External => {
                        if self.should_probe(&destination).await {
                            children.push(tokio::spawn(
                                self.clone().check_liveness(destination, page.clone()),
                            ));
                        }
                    }
                }
            }

            for joined in join_all(children).await {
                if let Err(e) = joined {
                    error!(url = %page, error = %e, "Crawl task failed");
                }
            }
        }
        .boxed()
    }

    async fn should_probe(&self, link: &PageId) -> bool {
        self.config.check_liveness
            && !self.config.known_dead.contains(link)
            && self.visited.claim(link).await
    }

    async fn check_liveness(self: Arc<Self>, link: PageId, referrer: PageId) {
        match self.fetcher.probe(&self.gate, &link).await {
            Ok(Liveness::Alive(status)) => {
                debug!(url = %link, status, "Outbound link is alive");
            }
            Ok(Liveness::Dead(reason)) => {
                warn!(url = %link, referrer = %referrer, reason = %reason, "Outbound link is dead");
                self.dead_links.lock().await.push(DeadLink {
                    url: link,
                    referrer,
                    reason,
                });
            }
            Err(e) => {
                error!(url = %link, error = %e, "Liveness probe could not run");
            }
        }
    }

    async fn record_failure(&self, page: PageId, error: ScanError) {
        let attempts = match error {
            ScanError::FetchExhausted { attempts, .. } => attempts,
            _ => 0,
        };
        self.fetch_failures.lock().await.push(FetchFailure {
            url: page,
            attempts,
            error: error.to_string(),
        });
    }
}
