// src/sources/rss.rs
//! Generic RSS-backed source getter.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::normalize_text;
use crate::pagination::SourceGetter;
use crate::types::ContentItem;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

fn parse_rfc2822_to_unix_ms(ts: &str) -> Option<i64> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| (dt.to_offset(UtcOffset::UTC).unix_timestamp_nanos() / 1_000_000) as i64)
}

/// Parse an RSS document into content items. The item link doubles as the
/// identity key, matching upstream feeds that carry no guid.
pub fn parse_rss_items(xml: &str) -> Result<Vec<ContentItem>> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let Some(link) = it.link.filter(|l| !l.is_empty()) else {
            continue;
        };
        let title = normalize_text(it.title.as_deref().unwrap_or_default());
        if title.is_empty() {
            continue;
        }
        let mut item = ContentItem::new(link.as_str(), title, link.as_str());
        item.published_at = it.pub_date.as_deref().and_then(parse_rfc2822_to_unix_ms);
        out.push(item);
    }
    Ok(out)
}

pub struct RssSource {
    client: reqwest::Client,
    url: String,
}

impl RssSource {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl SourceGetter for RssSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        let body = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("rss get {}", self.url))?
            .text()
            .await
            .context("rss body")?;
        let items = parse_rss_items(&body)?;
        if items.is_empty() {
            bail!("cannot fetch rss data from {}", self.url);
        }
        Ok(items)
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
