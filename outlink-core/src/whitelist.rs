//! Operator-approved outbound domains.

use crate::error::{CoreError, Result};
use crate::lists::parse_list;
use outlink_scanner::PageId;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use url::Host;

/// Strip a leading `www.` from a host.
pub fn bare_domain(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Whitelisted domains, each held in both its bare and `www.` form.
#[derive(Debug, Clone)]
pub struct Whitelist {
    path: PathBuf,
    domains: HashSet<String>,
}

impl Whitelist {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            domains: HashSet::new(),
        }
    }

    /// Load the whitelist file. A missing file is an empty whitelist; it is
    /// created on the first accepted domain.
    pub fn load(path: &Path) -> Result<Self> {
        let mut whitelist = Self::empty(path);

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    file = %path.display(),
                    "Domain whitelist file does not exist, it will be created later"
                );
                return Ok(whitelist);
            }
            Err(source) => {
                return Err(CoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let mut count = 0;
        for line in parse_list(&content) {
            match Host::parse(&line) {
                Ok(host) => {
                    whitelist.add(&host.to_string());
                    count += 1;
                }
                Err(e) => {
                    warn!(file = %path.display(), line = %line, error = %e, "Skipping invalid domain")
                }
            }
        }

        info!(file = %path.display(), count, "Domain whitelist file loaded");
        Ok(whitelist)
    }

    /// Add a domain in memory, in both bare and `www.` form.
    pub fn add(&mut self, domain: &str) {
        let domain = bare_domain(domain);
        self.domains.insert(domain.to_string());
        self.domains.insert(format!("www.{}", domain));
    }

    /// Add a domain and append it to the whitelist file.
    ///
    /// A write failure is returned rather than swallowed: an accepted domain
    /// that never reaches disk would be asked about again next run.
    pub fn accept(&mut self, domain: &str) -> Result<()> {
        let domain = bare_domain(domain);
        self.add(domain);

        let persist_error = |source| CoreError::Persist {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(persist_error)?;
        writeln!(file, "{}", domain).map_err(persist_error)?;
        file.flush().map_err(persist_error)?;

        info!(domain = %domain, file = %self.path.display(), "Domain whitelisted");
        Ok(())
    }

    pub fn contains_host(&self, host: &str) -> bool {
        self.domains.contains(host)
    }

    pub fn contains(&self, page: &PageId) -> bool {
        page.host().is_some_and(|host| self.contains_host(host))
    }

    /// Number of distinct domains, counting bare and `www.` forms once.
    pub fn len(&self) -> usize {
        self.domains
            .iter()
            .filter(|domain| !domain.starts_with("www.") || !self.domains.contains(&domain[4..]))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_domain() {
        assert_eq!(bare_domain("www.ext.test"), "ext.test");
        assert_eq!(bare_domain("ext.test"), "ext.test");
        assert_eq!(bare_domain("blog.ext.test"), "blog.ext.test");
    }

    #[test]
    fn test_add_covers_both_forms() {
        let mut whitelist = Whitelist::empty("unused.txt");
        whitelist.add("www.ext.test");
        assert!(whitelist.contains_host("ext.test"));
        assert!(whitelist.contains_host("www.ext.test"));
        assert!(!whitelist.contains_host("blog.ext.test"));
        assert_eq!(whitelist.len(), 1);
    }

    #[test]
    fn test_contains_page() {
        let mut whitelist = Whitelist::empty("unused.txt");
        whitelist.add("ext.test");
        assert!(whitelist.contains(&PageId::parse("https://www.ext.test/a").unwrap()));
        assert!(!whitelist.contains(&PageId::parse("https://other.test/a").unwrap()));
    }
}
