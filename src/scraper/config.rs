use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::domain::UrlRules;

/// Configuration for the batch scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Enable the batch preview capability (default: true)
    pub enabled: bool,

    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Chrome/Chromium binary to launch instead of the one found in PATH
    pub chrome_executable: Option<PathBuf>,

    /// Navigation timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// Best-effort wait for a populated body in milliseconds (default: 8000)
    pub ready_timeout_ms: u64,

    /// Poll interval while waiting for readiness signals (default: 250)
    pub poll_interval_ms: u64,

    /// Wait after the readiness signal for client-side rendering (default: 3000)
    pub settle_delay_ms: u64,

    /// Delay after each page before its worker takes the next URL (default: 1000)
    pub request_delay_ms: u64,

    /// Maximum concurrent browser pages (default: 2)
    pub max_concurrency: usize,

    /// Maximum URLs accepted in one batch (default: 50)
    pub max_batch_urls: usize,

    /// Upper bound for a whole batch in seconds (default: 900)
    pub batch_timeout_secs: u64,

    /// Selectors signalling a populated body; any one is enough
    pub ready_signals: Vec<String>,

    /// Accepted shape of column URLs
    pub url_rules: UrlRules,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            chrome_executable: None,
            timeout_secs: 30,
            ready_timeout_ms: 8000,
            poll_interval_ms: 250,
            settle_delay_ms: 3000,
            request_delay_ms: 1000,
            max_concurrency: 2,
            max_batch_urls: 50,
            batch_timeout_secs: 900,
            ready_signals: vec![
                ".stats".to_string(),
                "h1".to_string(),
                ".paper-info".to_string(),
            ],
            url_rules: UrlRules::default(),
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
        }
    }
}

impl ScraperConfig {
    /// Get the navigation timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    /// Take the timing and concurrency settings of `preset`, keeping everything else.
    pub fn with_timings_from(self, preset: &ScraperConfig) -> Self {
        Self {
            timeout_secs: preset.timeout_secs,
            ready_timeout_ms: preset.ready_timeout_ms,
            settle_delay_ms: preset.settle_delay_ms,
            request_delay_ms: preset.request_delay_ms,
            max_concurrency: preset.max_concurrency,
            ..self
        }
    }

    /// Create a config optimized for speed (less accurate)
    pub fn fast() -> Self {
        Self {
            timeout_secs: 15,
            ready_timeout_ms: 4000,
            settle_delay_ms: 1000,
            request_delay_ms: 500,
            max_concurrency: 4,
            ..Default::default()
        }
    }

    /// Create a config optimized for accuracy and politeness (slower)
    pub fn thorough() -> Self {
        Self {
            timeout_secs: 60,
            ready_timeout_ms: 10_000,
            settle_delay_ms: 3000,
            request_delay_ms: 2000,
            max_concurrency: 1,
            ..Default::default()
        }
    }
}
