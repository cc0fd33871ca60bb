//! Newline-separated list files shared by the whitelist and the dead-url list.

use crate::error::{CoreError, Result};
use outlink_scanner::PageId;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// Entries of a list file: trimmed, skipping blank lines and `//` comments.
pub fn parse_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("//"))
        .map(String::from)
        .collect()
}

/// Load the external URLs known to be dead or to block crawlers.
///
/// The file must exist, even if empty. Lines that are not URLs are dropped.
pub fn load_known_dead(path: &Path) -> Result<HashSet<PageId>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(CoreError::MissingDeadList(path.to_path_buf()));
        }
        Err(source) => {
            return Err(CoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut urls = HashSet::new();
    for line in parse_list(&content) {
        match PageId::parse(&line) {
            Ok(url) => {
                urls.insert(url);
            }
            Err(e) => warn!(file = %path.display(), line = %line, error = %e, "Skipping invalid url"),
        }
    }

    info!(file = %path.display(), count = urls.len(), "Known dead/blocked url file loaded");
    Ok(urls)
}
