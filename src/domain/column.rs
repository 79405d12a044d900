use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::PreviewRecord;

/// A reviewed record accepted for bulk insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewColumn {
    pub url: String,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub subscribers: u64,
    #[serde(default)]
    pub content_count: u64,
}

impl From<PreviewRecord> for NewColumn {
    fn from(record: PreviewRecord) -> Self {
        let description = Some(record.description).filter(|d| !d.trim().is_empty());
        Self {
            url: record.url,
            name: record.name,
            author: record.author,
            avatar: record.avatar,
            description,
            subscribers: record.reader_count,
            content_count: record.content_count,
        }
    }
}

/// A persisted column row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub url: String,
    pub name: String,
    pub author: String,
    pub avatar: String,
    pub description: Option<String>,
    pub subscribers: u64,
    pub content_count: u64,
    pub category_id: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Column {
    /// Build an unpublished, uncategorized row from an accepted record.
    pub fn from_new(new: &NewColumn, seq: usize, now: DateTime<Utc>) -> Self {
        Self {
            id: Self::generate_id(&new.url, seq, now),
            url: new.url.clone(),
            name: new.name.clone(),
            author: new.author.clone(),
            avatar: new.avatar.clone(),
            description: new.description.clone(),
            subscribers: new.subscribers,
            content_count: new.content_count,
            category_id: None,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 24 hex chars derived from the URL, the batch position and the insert time
    pub fn generate_id(url: &str, seq: usize, now: DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        hasher.update(seq.to_le_bytes());
        hasher.update(now.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        let mut id = hex::encode(hasher.finalize());
        id.truncate(24);
        id
    }
}
