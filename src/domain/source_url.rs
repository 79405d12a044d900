use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Shape a content-item URL must have before it is worth a browser navigation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlRules {
    /// Path segment marking a column page, e.g. `/p/` in `https://host/p/abc`
    pub path_marker: String,

    /// Hosts accepted for scraping, subdomains included. Empty accepts any host.
    pub allowed_hosts: Vec<String>,
}

impl Default for UrlRules {
    fn default() -> Self {
        Self {
            path_marker: "/p/".to_string(),
            allowed_hosts: vec!["xiaobot.net".to_string()],
        }
    }
}

impl UrlRules {
    /// The default path rule with no host restriction
    pub fn any_host() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            ..Default::default()
        }
    }

    fn host_allowed(&self, host: &str) -> bool {
        self.allowed_hosts.is_empty()
            || self
                .allowed_hosts
                .iter()
                .any(|allowed| host == allowed || host.ends_with(&format!(".{allowed}")))
    }
}

/// Why a string was refused as a [`SourceUrl`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlRejection {
    #[error("not a URL: {0}")]
    Unparseable(String),

    #[error("unsupported scheme `{0}`")]
    Scheme(String),

    #[error("host `{0}` is not an allowed column host")]
    Host(String),

    #[error("path does not contain `{0}` followed by a column id")]
    PathShape(String),
}

/// A syntactically valid column page URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    raw: String,
    parsed: Url,
}

impl SourceUrl {
    /// Validate `input` against `rules`. Surrounding whitespace is ignored.
    pub fn parse(input: &str, rules: &UrlRules) -> Result<Self, UrlRejection> {
        let raw = input.trim();
        let parsed = Url::parse(raw).map_err(|_| UrlRejection::Unparseable(raw.to_string()))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UrlRejection::Scheme(parsed.scheme().to_string()));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| UrlRejection::Unparseable(raw.to_string()))?;
        if !rules.host_allowed(host) {
            return Err(UrlRejection::Host(host.to_string()));
        }

        let marker = rules.path_marker.as_str();
        let has_item = parsed
            .path()
            .find(marker)
            .map(|at| &parsed.path()[at + marker.len()..])
            .is_some_and(|rest| !rest.trim_matches('/').is_empty());
        if !has_item {
            return Err(UrlRejection::PathShape(marker.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            parsed,
        })
    }

    /// The URL exactly as the caller supplied it (trimmed).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.parsed
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
