use serde::{Deserialize, Serialize};

/// Structured, unsaved metadata scraped from one column page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRecord {
    pub url: String,
    pub name: String,
    pub author: String,
    pub description: String,
    pub avatar: String,
    pub reader_count: u64,
    pub content_count: u64,
}

impl PreviewRecord {
    /// A record without a name is a failed extraction.
    pub fn is_usable(&self) -> bool {
        !self.name.trim().is_empty()
    }
}
