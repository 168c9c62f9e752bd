// src/sources/lobsters.rs
//! Lobsters hottest stories, a plain JSON source without pagination.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::pagination::SourceGetter;
use crate::types::{ContentItem, ItemExtra};

const HOTTEST_URL: &str = "https://lobste.rs/hottest.json";
const MAX_STORIES: usize = 30;

#[derive(Debug, Deserialize)]
struct Story {
    short_id: Option<String>,
    title: Option<String>,
    comments_url: Option<String>,
    score: Option<i64>,
    #[serde(default)]
    tags: Vec<String>,
    created_at: Option<String>,
}

pub fn parse_hottest(json: &str) -> Result<Vec<ContentItem>> {
    let stories: Vec<Story> = serde_json::from_str(json).context("parsing lobsters hottest")?;

    let mut items = Vec::new();
    for story in stories.into_iter().take(MAX_STORIES) {
        let (Some(id), Some(title)) = (story.short_id, story.title) else {
            continue;
        };
        let Some(url) = story.comments_url else {
            continue;
        };
        let mut item = ContentItem::new(id.as_str(), title, url);
        item.published_at = story
            .created_at
            .as_deref()
            .and_then(|ts| chrono::DateTime::parse_from_rfc3339(ts).ok())
            .map(|dt| dt.timestamp_millis());
        item.extra = Some(ItemExtra {
            info: story.score.map(|s| format!("{s} pts")),
            hover: (!story.tags.is_empty()).then(|| story.tags.join(", ")),
        });
        items.push(item);
    }
    Ok(items)
}

pub struct LobstersSource {
    client: reqwest::Client,
}

impl LobstersSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceGetter for LobstersSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        let body = self
            .client
            .get(HOTTEST_URL)
            .send()
            .await
            .context("lobsters hottest get")?
            .text()
            .await
            .context("lobsters hottest body")?;
        parse_hottest(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"[
      {"short_id": "abc123", "title": "A systems story", "comments_url": "https://lobste.rs/s/abc123",
       "score": 42, "tags": ["rust", "performance"], "created_at": "2026-08-03T12:00:00.000-05:00"},
      {"short_id": "def456", "title": "Untagged story", "comments_url": "https://lobste.rs/s/def456",
       "score": 3, "tags": []},
      {"title": "missing id, dropped"}
    ]"#;

    #[test]
    fn parses_stories_with_tag_hover() {
        let items = parse_hottest(FIXTURE).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.id, "abc123".into());
        assert_eq!(first.url, "https://lobste.rs/s/abc123");
        assert!(first.published_at.is_some());
        let extra = first.extra.as_ref().unwrap();
        assert_eq!(extra.info.as_deref(), Some("42 pts"));
        assert_eq!(extra.hover.as_deref(), Some("rust, performance"));

        assert!(items[1].extra.as_ref().unwrap().hover.is_none());
    }
}
