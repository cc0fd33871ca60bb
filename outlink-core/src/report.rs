// Outbound link report built from a finished crawl

use crate::error::{CoreError, Result};
use crate::whitelist::{Whitelist, bare_domain};
use colored::Colorize;
use outlink_scanner::{
    CrawlOutcome, DeadLink, FetchFailure, LinkKind, PageId, PageRecord, classify,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// One off-site destination and the pages that link to it.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundLink {
    pub url: PageId,
    pub domain: String,
    /// Sorted, without duplicates. Never empty.
    pub referrers: Vec<PageId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutboundReport {
    pub domain: String,
    pub pages_crawled: usize,
    pub pages_claimed: usize,
    pub outbound: Vec<OutboundLink>,
    pub whitelisted_links: usize,
    pub unreachable_pages: Vec<FetchFailure>,
    pub error_pages: Vec<PageRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_links: Option<Vec<DeadLink>>,
}

impl OutboundReport {
    /// Collect every external, non-whitelisted destination in the link graph.
    ///
    /// `dead_links` is only reported when liveness checks ran.
    pub fn build(
        outcome: &CrawlOutcome,
        domain: &str,
        whitelist: &Whitelist,
        liveness_checked: bool,
    ) -> Self {
        let mut by_destination: BTreeMap<&PageId, Vec<PageId>> = BTreeMap::new();
        let mut whitelisted_links = 0;

        for (source, destinations) in &outcome.edges {
            for destination in destinations {
                if classify(destination, domain) == LinkKind::Internal {
                    continue;
                }
                if whitelist.contains(destination) {
                    whitelisted_links += 1;
                    continue;
                }
                let referrers = by_destination.entry(destination).or_default();
                if !referrers.contains(source) {
                    referrers.push(source.clone());
                }
            }
        }

        let outbound = by_destination
            .into_iter()
            .map(|(url, mut referrers)| {
                referrers.sort();
                OutboundLink {
                    domain: url.host().map(bare_domain).unwrap_or_default().to_string(),
                    url: url.clone(),
                    referrers,
                }
            })
            .collect();

        let mut unreachable_pages = outcome.fetch_failures.clone();
        unreachable_pages.sort_by(|a, b| a.url.cmp(&b.url));

        let mut error_pages: Vec<PageRecord> = outcome
            .pages
            .iter()
            .filter(|page| page.status_code >= 400)
            .cloned()
            .collect();
        error_pages.sort_by(|a, b| a.url.cmp(&b.url));

        let dead_links = liveness_checked.then(|| {
            let mut dead = outcome.dead_links.clone();
            dead.sort_by(|a, b| a.url.cmp(&b.url));
            dead
        });

        Self {
            domain: domain.to_string(),
            pages_crawled: outcome.pages.len(),
            pages_claimed: outcome.pages_claimed,
            outbound,
            whitelisted_links,
            unreachable_pages,
            error_pages,
            dead_links,
        }
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn generate_text_report(report: &OutboundReport) -> String {
    let mut out = String::new();
    out.push_str(DIVIDER);
    out.push_str("\n\n");
    out.push_str(&format!("{}\n", "# Summary:".bold()));
    out.push_str(&format!("  Domain: {}\n", report.domain));
    out.push_str(&format!("  Pages crawled: {}\n", report.pages_crawled));
    out.push_str(&format!("  Outbound links: {}\n", report.outbound.len()));
    out.push_str(&format!(
        "  Whitelisted links skipped: {}\n",
        report.whitelisted_links
    ));
    out.push_str(&format!(
        "  Unreachable internal pages: {}\n",
        report.unreachable_pages.len()
    ));
    if let Some(ref dead) = report.dead_links {
        out.push_str(&format!("  Dead outbound links: {}\n", dead.len()));
    }
    out.push('\n');
    out.push_str(DIVIDER);
    out.push_str("\n\n");

    out.push_str(&format!("{}\n", "## Outbound links".bold()));
    if report.outbound.is_empty() {
        out.push_str("  none\n");
    }
    let total = report.outbound.len();
    for (idx, link) in report.outbound.iter().enumerate() {
        out.push_str(&format!(
            "  [{}/{}] {}\n",
            idx + 1,
            total,
            link.url.as_str().cyan()
        ));
        if let Some(first) = link.referrers.first() {
            let others = link.referrers.len() - 1;
            if others > 0 {
                out.push_str(&format!(
                    "        linked from {} (+{} more)\n",
                    first.as_str().bright_black(),
                    others
                ));
            } else {
                out.push_str(&format!(
                    "        linked from {}\n",
                    first.as_str().bright_black()
                ));
            }
        }
    }

    if !report.unreachable_pages.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "## Unreachable internal pages".bold()));
        for failure in &report.unreachable_pages {
            out.push_str(&format!(
                "  {} {}\n        {}\n",
                "✗".red(),
                extract_url_path(failure.url.as_str()),
                failure.error.bright_black()
            ));
        }
    }

    if !report.error_pages.is_empty() {
        out.push('\n');
        out.push_str(&format!("{}\n", "## Internal pages with error status".bold()));
        for page in &report.error_pages {
            let status = match page.status_code {
                400..=499 => page.status_code.to_string().yellow(),
                _ => page.status_code.to_string().red(),
            };
            out.push_str(&format!(
                "  {} {}\n",
                status,
                extract_url_path(page.url.as_str())
            ));
        }
    }

    if let Some(ref dead) = report.dead_links {
        out.push('\n');
        out.push_str(&format!("{}\n", "## Dead outbound links".bold()));
        if dead.is_empty() {
            out.push_str("  none\n");
        }
        for link in dead {
            out.push_str(&format!(
                "  {} {} ({})\n        linked from {}\n",
                "✗".red(),
                link.url,
                link.reason,
                link.referrer.as_str().bright_black()
            ));
        }
    }

    out.push('\n');
    out
}

pub fn generate_json_report(report: &OutboundReport) -> Result<String> {
    let mut json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Outlink",
                "version": env!("CARGO_PKG_VERSION"),
                "format": "json",
            },
            "summary": {
                "domain": report.domain,
                "pages_crawled": report.pages_crawled,
                "pages_claimed": report.pages_claimed,
                "outbound_links": report.outbound.len(),
                "whitelisted_links": report.whitelisted_links,
                "unreachable_pages": report.unreachable_pages.len(),
            },
            "outbound": report.outbound,
            "unreachable_pages": report.unreachable_pages,
            "error_pages": report.error_pages,
        }
    });
    if let Some(ref dead) = report.dead_links {
        json_report["report"]["dead_links"] = serde_json::to_value(dead)?;
    }

    Ok(serde_json::to_string_pretty(&json_report)?)
}

pub fn render_report(report: &OutboundReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(report)),
        ReportFormat::Json => generate_json_report(report),
    }
}

pub fn save_report(content: &str, path: &Path) -> Result<()> {
    let write = || -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    };
    write().map_err(|source| CoreError::SaveReport {
        path: path.to_path_buf(),
        source,
    })
}
