//! # column-scout
//!
//! Batch ingestion of subscription-column pages for a curated directory.
//!
//! ## Architecture
//!
//! ```text
//! URLs → validate → browser (one per batch) → rendered page → field cascades → records → store
//! ```
//!
//! - [`scraper`]: headless Chrome page loading and the batch orchestrator
//! - [`extractor`]: ordered "first non-empty wins" cascades per field
//! - [`store`]: SQLite persistence of reviewed records
//! - [`server`]: HTTP API for preview and bulk save
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape a few pages and look at the result
//! column-scout preview https://xiaobot.net/p/abc https://xiaobot.net/p/def
//!
//! # Scrape a list and save what was found
//! column-scout import --file columns.txt
//!
//! # Serve the API
//! column-scout serve --bind 127.0.0.1:3000
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together config, store and metrics.
pub mod app;

/// Command-line interface using clap.
///
/// - `preview [URLS]... [--file F] [--json]` - Scrape and print records
/// - `import [URLS]... [--file F]` - Scrape and save records
/// - `list` - List saved columns
/// - `serve [--bind ADDR]` - Start the HTTP API
pub mod cli;

/// Configuration loaded from `~/.config/column-scout/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`SourceUrl`](domain::SourceUrl): a URL validated as a column page
/// - [`PreviewRecord`](domain::PreviewRecord): one scraped column, for review
/// - [`NewColumn`](domain::NewColumn) / [`Column`](domain::Column): the store's input and rows
pub mod domain;

/// Field extraction from rendered column pages.
pub mod extractor;

/// Timing samples per operation, shared by `Arc`.
pub mod metrics;

/// Browser-driven page loading and batch orchestration.
///
/// - [`BatchScraper`](scraper::BatchScraper): one browser per batch, bounded concurrency
/// - [`ChromeLauncher`](scraper::ChromeLauncher): chromiumoxide backend
/// - [`ScraperConfig`](scraper::ScraperConfig): timeouts, delays and limits
pub mod scraper;

/// HTTP API built on axum.
pub mod server;

/// SQLite persistence layer.
///
/// - [`ColumnStore`](store::ColumnStore): trait for saving reviewed columns
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
