use outlink_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File does not exist: {}, create an empty file", .0.display())]
    MissingDeadList(PathBuf),

    #[error("Failed to write whitelist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save report to {}: {source}", .path.display())]
    SaveReport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Crawl failed: {0}")]
    Scan(#[from] ScanError),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
