//! Configuration management for column-scout.
//!
//! Configuration is read from `~/.config/column-scout/config.toml` at startup
//! (or the path given with `--config`). If the file doesn't exist, a default
//! configuration with comments is created.

use crate::extractor::ExtractorConfig;
use crate::scraper::ScraperConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub extractor: ExtractorConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API listens on (default: 127.0.0.1:3000)
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to the platform data directory
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating a commented default there if missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/column-scout/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("column-scout").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# column-scout configuration
#
# Every key is optional; anything left out uses the built-in default.

[scraper]
# Set to false to turn the preview endpoint off (it answers 503)
enabled = true

# Run browser in headless mode (no visible window)
headless = true

# Chrome/Chromium binary, if it is not on PATH
# chrome_executable = "/usr/bin/chromium"

# Navigation timeout in seconds
timeout_secs = 30

# How long to wait for the page body and stats to appear (milliseconds)
ready_timeout_ms = 8000

# Extra wait after the page is ready, for client-side rendering (milliseconds)
settle_delay_ms = 3000

# Pause after each page before the worker takes the next URL (milliseconds)
request_delay_ms = 1000

# Maximum concurrent browser pages
max_concurrency = 2

# Maximum URLs accepted in one batch
max_batch_urls = 50

# Upper bound for one batch in seconds
batch_timeout_secs = 900

# Any of these selectors marks the page as rendered
ready_signals = [".stats", "h1", ".paper-info"]

[scraper.url_rules]
# Column URLs must contain this marker followed by an id
path_marker = "/p/"

# Hosts accepted for column URLs (subdomains included); empty accepts any
allowed_hosts = ["xiaobot.net"]

[extractor]
# Region holding the column title, intro and stats
info_container = ".paper-info"

# Author returned when nothing on the page names one
unknown_author = "unknown author"

# Descriptions are capped at these lengths (characters)
description_max_chars = 600
paragraph_max_chars = 300

# Regions searched for reader/content counts, in order
stats_selectors = [".stats", ".paper-info"]

[server]
bind = "127.0.0.1:3000"

[database]
# SQLite file; defaults to the platform data directory
# path = "/var/lib/column-scout/columns.db"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert!(config.scraper.enabled);
        assert_eq!(config.scraper.max_batch_urls, 50);
        assert_eq!(config.scraper.url_rules.path_marker, "/p/");
        assert_eq!(config.scraper.url_rules.allowed_hosts, vec!["xiaobot.net"]);
        assert_eq!(config.extractor.unknown_author, "unknown author");
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[scraper]
max_concurrency = 4

[server]
bind = "0.0.0.0:8080"
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.scraper.max_concurrency, 4);
        assert_eq!(config.server.bind, "0.0.0.0:8080");

        // Defaults
        assert_eq!(config.scraper.timeout_secs, 30);
        assert_eq!(config.extractor.author_selector, ".name");
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.scraper.settle_delay_ms, 3000);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.scraper.max_batch_urls, 50);

        // The written file loads back
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.server.bind, config.server.bind);
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[scraper]\ntimeout_secs = \"soon\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_any_host_from_file() {
        let content = r##"
[scraper.url_rules]
allowed_hosts = []
"##;
        let config: Config = toml::from_str(content).unwrap();
        assert!(config.scraper.url_rules.allowed_hosts.is_empty());
        assert_eq!(config.scraper.url_rules.path_marker, "/p/");
    }
}
