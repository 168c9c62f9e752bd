// src/sources/reddit.rs
//! Reddit r/popular adapter. The listing API pages with an opaque `after`
//! token, making this the cursor-based paginated source.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::pagination::{PaginatedPage, PaginatedSourceGetter, PaginationCursor, SourceGetter};
use crate::types::{ContentItem, ItemExtra};

const LISTING_URL: &str = "https://www.reddit.com/r/popular.json";
const PAGE_LIMIT: u32 = 30;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: Option<String>,
    title: Option<String>,
    permalink: Option<String>,
    score: Option<i64>,
    subreddit_name_prefixed: Option<String>,
    created_utc: Option<f64>,
}

/// Parse a listing response into items plus the continuation token.
pub fn parse_listing(json: &str) -> Result<(Vec<ContentItem>, Option<String>)> {
    let listing: Listing = serde_json::from_str(json).context("parsing reddit listing")?;

    let mut items = Vec::with_capacity(listing.data.children.len());
    for child in listing.data.children {
        let post = child.data;
        let (Some(id), Some(title)) = (post.id, post.title) else {
            continue;
        };
        let permalink = post.permalink.unwrap_or_default();
        let mut item = ContentItem::new(
            id.as_str(),
            title,
            format!("https://www.reddit.com{permalink}"),
        );
        item.published_at = post.created_utc.map(|s| (s * 1000.0) as i64);
        item.extra = Some(ItemExtra {
            info: post.score.map(|s| format!("↑ {s}")),
            hover: post.subreddit_name_prefixed,
        });
        items.push(item);
    }
    Ok((items, listing.data.after))
}

pub struct RedditSource {
    client: reqwest::Client,
}

impl RedditSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_listing(&self, after: Option<&str>) -> Result<(Vec<ContentItem>, Option<String>)> {
        let mut req = self
            .client
            .get(LISTING_URL)
            .query(&[("limit", PAGE_LIMIT.to_string())]);
        if let Some(after) = after {
            req = req.query(&[("after", after)]);
        }
        let body = req
            .send()
            .await
            .context("reddit listing get")?
            .text()
            .await
            .context("reddit listing body")?;
        parse_listing(&body)
    }
}

#[async_trait]
impl SourceGetter for RedditSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        let (items, _after) = self.fetch_listing(None).await?;
        Ok(items)
    }
}

#[async_trait]
impl PaginatedSourceGetter for RedditSource {
    async fn fetch_page(&self, cursor: Option<&PaginationCursor>) -> Result<PaginatedPage> {
        let after = match cursor {
            Some(PaginationCursor::Cursor(token)) => Some(token.as_str()),
            _ => None,
        };
        let (items, next) = self.fetch_listing(after).await?;
        Ok(PaginatedPage {
            items,
            has_more: next.is_some(),
            next_cursor: next,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
      "data": {
        "children": [
          {"data": {"id": "abc", "title": "A big story", "permalink": "/r/news/comments/abc/",
                    "score": 1234, "subreddit_name_prefixed": "r/news", "created_utc": 1754000000.0}},
          {"data": {"id": "def", "title": "Another one", "permalink": "/r/rust/comments/def/",
                    "score": 5, "subreddit_name_prefixed": "r/rust"}},
          {"data": {"title": "no id, dropped"}}
        ],
        "after": "t3_def"
      }
    }"#;

    #[test]
    fn parses_posts_and_continuation_token() {
        let (items, after) = parse_listing(FIXTURE).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(after.as_deref(), Some("t3_def"));

        let first = &items[0];
        assert_eq!(first.id, "abc".into());
        assert_eq!(first.url, "https://www.reddit.com/r/news/comments/abc/");
        assert_eq!(first.published_at, Some(1_754_000_000_000));
        let extra = first.extra.as_ref().unwrap();
        assert_eq!(extra.info.as_deref(), Some("↑ 1234"));
        assert_eq!(extra.hover.as_deref(), Some("r/news"));
    }

    #[test]
    fn terminal_listing_has_no_token() {
        let (items, after) =
            parse_listing(r#"{"data": {"children": [], "after": null}}"#).unwrap();
        assert!(items.is_empty());
        assert!(after.is_none());
    }
}
