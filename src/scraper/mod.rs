//! Browser-driven batch scraping of column pages.
//!
//! # Architecture
//!
//! ```text
//! BatchScraper::run(urls) → validate → launch browser (once per batch)
//!     → per URL: isolated context → PageLoader → RenderedPage → FieldExtractor → PreviewRecord
//!     → close contexts → close browser → ordered records
//! ```
//!
//! The browser is reached only through [`BrowserLauncher`], [`BrowserSession`]
//! and [`PageTab`]; [`ChromeLauncher`] implements them with chromiumoxide.
//!
//! # Usage
//!
//! ```rust,ignore
//! use column_scout::extractor::FieldExtractor;
//! use column_scout::scraper::{BatchScraper, ChromeLauncher, ScraperConfig};
//!
//! let config = ScraperConfig::default();
//! let scraper = BatchScraper::new(
//!     ChromeLauncher::new(config.clone()),
//!     config.clone(),
//!     FieldExtractor::default(),
//!     metrics,
//! );
//! let records = scraper.run(&urls, config.max_batch_urls).await?;
//! ```

mod batch;
mod chrome;
mod config;
mod loader;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::BatchScraper;
pub use chrome::{ChromeLauncher, ChromeSession, ChromeTab};
pub use config::ScraperConfig;
pub use loader::PageLoader;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::UrlRejection;

/// Per-page failures of the fetcher
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid target {url}: {reason}")]
    InvalidTarget { url: String, reason: UrlRejection },

    #[error("Failed to launch browser: {0}")]
    LaunchFailure(String),

    #[error("Timed out after {after:?} loading {url}")]
    Timeout { url: String, after: Duration },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationError { url: String, reason: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Cancelled while loading {url}")]
    Cancelled { url: String },
}

/// Batch-level failures; per-URL failures never surface here
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("At most {max} URLs per batch, got {count}")]
    TooMany { count: usize, max: usize },

    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(#[source] FetchError),
}

/// Starts a browser process for one batch
#[async_trait]
pub trait BrowserLauncher: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    async fn launch(&self) -> Result<Self::Session, FetchError>;
}

/// A running browser shared by the pages of one batch
#[async_trait]
pub trait BrowserSession: Send + Sync {
    type Tab: PageTab + 'static;

    /// Open a page in its own context (no cookies or storage shared with siblings)
    async fn new_isolated_context(&self) -> Result<Self::Tab, FetchError>;

    /// Close the page and dispose of its context
    async fn close_context(&self, tab: Self::Tab) -> Result<(), FetchError>;

    /// Shut the browser down. Later calls are no-ops.
    async fn close(&self) -> Result<(), FetchError>;
}

/// One isolated page. All queries are read-only.
#[async_trait]
pub trait PageTab: Send + Sync {
    /// Navigate and wait for the document to load
    async fn navigate(&self, url: &str) -> Result<(), FetchError>;

    async fn has_element(&self, selector: &str) -> bool;

    /// Serialized DOM as currently rendered
    async fn content(&self) -> Result<String, FetchError>;

    /// Poll until any selector matches. Returns false when `timeout` passes first.
    async fn wait_for_signal(&self, selectors: &[String], timeout: Duration, poll: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            for selector in selectors {
                if self.has_element(selector).await {
                    return true;
                }
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return false;
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }
}
