// src/sources/mod.rs
//! Builtin upstream source adapters and their registration.

pub mod hackernews;
pub mod lobsters;
pub mod reddit;
pub mod rss;

use std::sync::Arc;

use crate::registry::{SourceDescriptor, SourceRegistry};

const MINUTE_MS: i64 = 60 * 1000;

/// Register the builtin sources with their default refresh intervals.
/// Intervals and extra aliases can be overridden via `config/sources.toml`.
pub fn register_builtin(registry: &mut SourceRegistry, client: &reqwest::Client) {
    let hn = Arc::new(hackernews::HackerNewsSource::new(client.clone()));
    registry.register(
        SourceDescriptor::new("hackernews", 10 * MINUTE_MS),
        hn.clone(),
    );
    registry.register_paginated("hackernews", hn);
    registry.register_alias("hn", "hackernews");

    let reddit = Arc::new(reddit::RedditSource::new(client.clone()));
    registry.register(SourceDescriptor::new("reddit", 10 * MINUTE_MS), reddit.clone());
    registry.register_paginated("reddit", reddit);

    registry.register(
        SourceDescriptor::new("lobsters", 15 * MINUTE_MS),
        Arc::new(lobsters::LobstersSource::new(client.clone())),
    );

    registry.register(
        SourceDescriptor::new("techcrunch", 30 * MINUTE_MS),
        Arc::new(rss::RssSource::new(
            client.clone(),
            "https://techcrunch.com/feed/",
        )),
    );

    registry.register(
        SourceDescriptor::new("slashdot", 30 * MINUTE_MS),
        Arc::new(rss::RssSource::new(
            client.clone(),
            "https://rss.slashdot.org/Slashdot/slashdotMain",
        )),
    );
}

/// Normalize upstream text: decode HTML entities, strip tags, collapse
/// whitespace, trim.
pub(crate) fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}
