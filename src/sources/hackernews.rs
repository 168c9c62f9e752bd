// src/sources/hackernews.rs
//! Hacker News front page via the Algolia search API, paginated by page
//! number.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use crate::pagination::{PaginatedPage, PaginatedSourceGetter, PaginationCursor, SourceGetter};
use crate::types::{ContentItem, ItemExtra};

const SEARCH_URL: &str = "https://hn.algolia.com/api/v1/search";
const PAGE_SIZE: u32 = 30;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
    page: u32,
    #[serde(rename = "nbPages")]
    nb_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "objectID")]
    object_id: String,
    title: Option<String>,
    url: Option<String>,
    points: Option<i64>,
    created_at_i: Option<i64>,
}

/// Parse one search page into a paginated page with a next-page number
/// while more pages remain.
pub fn parse_search_page(json: &str) -> Result<PaginatedPage> {
    let resp: SearchResponse = serde_json::from_str(json).context("parsing hn search page")?;

    let mut items = Vec::with_capacity(resp.hits.len());
    for hit in resp.hits {
        let Some(title) = hit.title.filter(|t| !t.is_empty()) else {
            continue;
        };
        let url = hit.url.filter(|u| !u.is_empty()).unwrap_or_else(|| {
            format!("https://news.ycombinator.com/item?id={}", hit.object_id)
        });
        let mut item = ContentItem::new(hit.object_id.as_str(), title, url);
        item.published_at = hit.created_at_i.map(|s| s * 1000);
        item.extra = Some(ItemExtra {
            info: hit.points.map(|p| format!("{p} points")),
            hover: None,
        });
        items.push(item);
    }

    let next = resp.page + 1;
    let has_more = next < resp.nb_pages;
    Ok(PaginatedPage {
        items,
        has_more,
        next_page: has_more.then_some(next),
        ..Default::default()
    })
}

pub struct HackerNewsSource {
    client: reqwest::Client,
}

impl HackerNewsSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn fetch_search_page(&self, page: u32) -> Result<PaginatedPage> {
        let body = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("tags", "front_page".to_string()),
                ("hitsPerPage", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await
            .context("hn search get")?
            .text()
            .await
            .context("hn search body")?;
        parse_search_page(&body)
    }
}

#[async_trait]
impl SourceGetter for HackerNewsSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        Ok(self.fetch_search_page(0).await?.items)
    }
}

#[async_trait]
impl PaginatedSourceGetter for HackerNewsSource {
    async fn fetch_page(&self, cursor: Option<&PaginationCursor>) -> Result<PaginatedPage> {
        let page = match cursor {
            Some(PaginationCursor::Page(p)) => *p,
            _ => 0,
        };
        self.fetch_search_page(page).await
    }
}
