// tests/api_cache.rs
//
// Integration tests for cache tier behavior and failure fallback through
// the HTTP surface.
//
// Covered:
// - fetch then fresh-hit for the same source (upstream called once)
// - expired entries trigger a refetch and a rewrite
// - upstream failure served from stale cache, of any staleness
// - upstream failure without cache is a 500
// - `latest` forces a refresh only for eligible callers

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use newsdeck::api::{self, AppState, REFRESH_TOKEN_HEADER};
use newsdeck::cache::{CacheStore, MemoryCache};
use newsdeck::config::ServiceConfig;
use newsdeck::orchestrator::FetchOrchestrator;
use newsdeck::pagination::SourceGetter;
use newsdeck::registry::{SourceDescriptor, SourceRegistry};
use newsdeck::types::{now_ms, CacheEntry, ContentItem};

const BODY_LIMIT: usize = 1024 * 1024;
const INTERVAL_MS: i64 = 5 * 60 * 1000;

/// Upstream stub whose failure mode can be flipped mid-test.
struct ToggleSource {
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl SourceGetter for ToggleSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("upstream down"));
        }
        Ok((0..3i64)
            .map(|i| ContentItem::new(i, format!("live story {i}"), "https://example.com"))
            .collect())
    }
}

struct Harness {
    router: Router,
    cache: Arc<MemoryCache>,
    fail: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

fn harness_with(config: ServiceConfig) -> Harness {
    let fail = Arc::new(AtomicBool::new(false));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut registry = SourceRegistry::new();
    registry.register(
        SourceDescriptor::new("lobsters", INTERVAL_MS),
        Arc::new(ToggleSource {
            fail: fail.clone(),
            calls: calls.clone(),
        }),
    );

    let cache = Arc::new(MemoryCache::new());
    let orchestrator = Arc::new(FetchOrchestrator::new(
        Arc::new(registry),
        cache.clone(),
        config,
    ));

    Harness {
        router: api::router(AppState { orchestrator }),
        cache,
        fail,
        calls,
    }
}

fn harness() -> Harness {
    harness_with(ServiceConfig {
        defer_cache_writes: false,
        ..ServiceConfig::default()
    })
}

fn seed(h: &Harness, age_ms: i64, titles: &[&str]) -> i64 {
    let updated_at = now_ms() - age_ms;
    let items = titles
        .iter()
        .enumerate()
        .map(|(i, t)| ContentItem::new(100 + i as i64, *t, "https://example.com"))
        .collect();
    h.cache.insert_entry("lobsters", CacheEntry { items, updated_at });
    updated_at
}

async fn get(router: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Json) {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(REFRESH_TOKEN_HEADER, token);
    }
    let req = builder.body(Body::empty()).expect("build request");
    let resp = router.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn fetch_then_fresh_hit_calls_upstream_once() {
    let h = harness();

    let (s1, j1) = get(&h.router, "/api/s?id=lobsters", None).await;
    assert_eq!(s1, StatusCode::OK);
    assert_eq!(j1["status"], "success");
    assert_eq!(h.calls.load(Ordering::SeqCst), 1, "first request fetches");

    let (s2, j2) = get(&h.router, "/api/s?id=lobsters", None).await;
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(j2["status"], "success");
    assert_eq!(
        h.calls.load(Ordering::SeqCst),
        1,
        "second request is a fresh cache hit"
    );
}

#[tokio::test]
async fn expired_entry_is_refetched_and_rewritten() {
    let h = harness();
    seed(&h, 25 * 60 * 60 * 1000, &["ancient story"]);

    let (status, json) = get(&h.router, "/api/s?id=lobsters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["items"][0]["title"], "live story 0");
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);

    let entry = h.cache.get("lobsters").await.unwrap().unwrap();
    assert_eq!(entry.items[0].title, "live story 0");
    assert!(entry.updated_at >= now_ms() - 2_000);
}

#[tokio::test]
async fn upstream_failure_falls_back_to_stale_cache() {
    let h = harness();
    // Even beyond the global TTL the entry remains usable as an explicit
    // error fallback.
    let updated_at = seed(&h, 25 * 60 * 60 * 1000, &["old but gold"]);
    h.fail.store(true, Ordering::SeqCst);

    let (status, json) = get(&h.router, "/api/s?id=lobsters", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cache");
    assert_eq!(json["updatedTime"].as_i64().unwrap(), updated_at);
    assert_eq!(json["items"][0]["title"], "old but gold");
}

#[tokio::test]
async fn upstream_failure_fallback_applies_filters() {
    let h = harness();
    seed(&h, 25 * 60 * 60 * 1000, &["ai breakthrough", "soccer recap"]);
    h.fail.store(true, Ordering::SeqCst);

    let filter = "%5B%7B%22pattern%22%3A%22ai%22%2C%22type%22%3A%22include%22%7D%5D";
    let (status, json) = get(
        &h.router,
        &format!("/api/s?id=lobsters&filter={filter}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cache");
    let items = json["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "ai breakthrough");
}

#[tokio::test]
async fn upstream_failure_without_cache_is_a_500() {
    let h = harness();
    h.fail.store(true, Ordering::SeqCst);

    let (status, json) = get(&h.router, "/api/s?id=lobsters", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = json["message"].as_str().expect("message field");
    assert!(message.contains("lobsters"), "got: {message}");
}

#[tokio::test]
async fn latest_in_open_mode_forces_refresh_of_stale_entry() {
    let h = harness();
    seed(&h, 20 * 60 * 1000, &["stale story"]);

    let (status, json) = get(&h.router, "/api/s?id=lobsters&latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["items"][0]["title"], "live story 0");
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn latest_false_literal_is_not_latest() {
    let h = harness();
    let updated_at = seed(&h, 20 * 60 * 1000, &["stale story"]);

    let (status, json) = get(&h.router, "/api/s?id=lobsters&latest=false", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cache");
    assert_eq!(json["updatedTime"].as_i64().unwrap(), updated_at);
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn latest_with_token_gating_requires_the_token() {
    let h = harness_with(ServiceConfig {
        defer_cache_writes: false,
        refresh_token: Some("s3cret".into()),
        ..ServiceConfig::default()
    });
    seed(&h, 20 * 60 * 1000, &["stale story"]);

    // Ineligible caller keeps getting the stale tier.
    let (status, json) = get(&h.router, "/api/s?id=lobsters&latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "cache");
    assert_eq!(h.calls.load(Ordering::SeqCst), 0);

    // Token holder forces the fetch.
    let (status, json) = get(&h.router, "/api/s?id=lobsters&latest", Some("s3cret")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(h.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn latest_does_not_bypass_the_fresh_tier() {
    let h = harness();
    seed(&h, 10_000, &["fresh story"]);

    let (status, json) = get(&h.router, "/api/s?id=lobsters&latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["items"][0]["title"], "fresh story");
    assert_eq!(h.calls.load(Ordering::SeqCst), 0, "fresh tier still wins");
}
