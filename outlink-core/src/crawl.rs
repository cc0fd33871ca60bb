use crate::error::Result;
use indicatif::{ProgressBar, ProgressStyle};
use outlink_scanner::{CrawlConfig, CrawlOutcome, Crawler};
use std::sync::Arc;
use std::time::Duration;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub start_url: String,
    pub config: CrawlConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Execute a crawl with the given options
/// Returns the finished link graph and page bookkeeping
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlOutcome> {
    let CrawlOptions {
        start_url,
        config,
        show_progress_bars,
    } = options;

    // Single spinner for the whole crawl (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let limit = config.page_limit;
    let mut crawler = Crawler::new(config)?;

    if progress_bar.is_some() || progress_callback.is_some() {
        let pb_clone = progress_bar.clone();
        let callback_clone = progress_callback.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |count: usize, url: String| {
            if let Some(ref pb) = pb_clone {
                match limit {
                    Some(limit) => pb.set_message(format!("Crawling [{}/{}] {}", count, limit, url)),
                    None => pb.set_message(format!("Crawling [{}] {}", count, url)),
                }
            }
            if let Some(ref callback) = callback_clone {
                callback(url);
            }
        }));
    }

    let outcome = crawler.crawl(&start_url).await;

    if let Some(ref pb) = progress_bar {
        match outcome {
            Ok(ref outcome) => pb.finish_with_message(format!(
                "Crawl complete! {} pages crawled",
                outcome.pages.len()
            )),
            Err(_) => pb.finish_and_clear(),
        }
    }

    Ok(outcome?)
}
