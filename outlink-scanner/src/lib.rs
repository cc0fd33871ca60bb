pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod gate;
pub mod link;
pub mod result;
pub mod state;

pub use config::CrawlConfig;
pub use crawler::{Crawler, ProgressCallback};
pub use error::ScanError;
pub use link::{LinkKind, PageId, classify, normalize};
pub use result::{CrawlOutcome, DeadLink, DeadReason, FetchFailure, Liveness, PageRecord};
