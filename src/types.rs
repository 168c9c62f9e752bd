// src/types.rs
//! Wire types shared by the cache, the fetch path, and the HTTP surface.

use serde::{Deserialize, Serialize};

/// Item identity within a single source's result set. Upstreams disagree on
/// whether ids are strings or integers, so both shapes are accepted on the
/// wire and preserved on output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Num(i64),
    Text(String),
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        ItemId::Text(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        ItemId::Text(s)
    }
}

impl From<i64> for ItemId {
    fn from(n: i64) -> Self {
        ItemId::Num(n)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemId::Num(n) => write!(f, "{n}"),
            ItemId::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemExtra {
    /// Short decoration shown next to the title, e.g. "342 points".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Longer hover text; participates in filter matching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
}

/// One aggregated content item. `id` is unique within a single source's
/// result set for a given fetch, not globally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ItemId,
    pub title: String,
    pub url: String,
    /// Unix milliseconds.
    #[serde(rename = "pubDate", default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<ItemExtra>,
}

impl ContentItem {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            published_at: None,
            extra: None,
        }
    }
}

/// Last known item set for one source, replaced atomically on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub items: Vec<ContentItem>,
    /// Unix milliseconds of the write.
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// Freshly fetched, or cache still inside the source's refresh interval.
    Success,
    /// Served from a stale cache entry.
    Cache,
}

/// Body of `GET /api/s`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceResponse {
    pub status: ResponseStatus,
    pub id: String,
    #[serde(rename = "updatedTime")]
    pub updated_time: i64,
    pub items: Vec<ContentItem>,
}

/// Current wall-clock in unix milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_accepts_both_wire_shapes() {
        let s: ItemId = serde_json::from_str(r#""abc123""#).unwrap();
        assert_eq!(s, ItemId::Text("abc123".into()));
        let n: ItemId = serde_json::from_str("42").unwrap();
        assert_eq!(n, ItemId::Num(42));
    }

    #[test]
    fn content_item_omits_empty_optionals() {
        let item = ContentItem::new("a", "Title", "https://example.com/a");
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("pubDate").is_none());
        assert!(json.get("extra").is_none());
    }

    #[test]
    fn response_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Success).unwrap(),
            r#""success""#
        );
        assert_eq!(
            serde_json::to_string(&ResponseStatus::Cache).unwrap(),
            r#""cache""#
        );
    }
}
