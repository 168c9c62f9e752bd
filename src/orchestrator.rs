// src/orchestrator.rs
//! Request-level fetch controller. Resolves the source id, walks the cache
//! freshness tiers, runs the plain or filtered-paginated fetch, applies the
//! cache-write policy, and falls back to stale cache when a live fetch
//! fails.

use std::sync::Arc;

use metrics::counter;
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::config::ServiceConfig;
use crate::error::ServeError;
use crate::fetch::fetch_with_filter;
use crate::filter::{apply_filters, FilterRule};
use crate::metrics::ensure_serve_metrics_described;
use crate::registry::SourceRegistry;
use crate::types::{now_ms, CacheEntry, ContentItem, ResponseStatus, SourceResponse};

/// Per-request caller context.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
    /// Caller asked for strict freshness (`latest` query parameter).
    pub latest: bool,
    /// Caller is eligible to force a refresh inside the stale-OK window.
    pub can_force_refresh: bool,
}

pub struct FetchOrchestrator {
    registry: Arc<SourceRegistry>,
    cache: Arc<dyn CacheStore>,
    config: ServiceConfig,
}

impl FetchOrchestrator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        cache: Arc<dyn CacheStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Serve one request for `requested_id` with the caller's filter rules.
    pub async fn serve(
        &self,
        requested_id: &str,
        rules: &[FilterRule],
        opts: &RequestOptions,
    ) -> Result<SourceResponse, ServeError> {
        ensure_serve_metrics_described();
        counter!("serve_requests_total").increment(1);

        let id = self.registry.resolve(requested_id)?;
        let has_filters = !rules.is_empty();

        // Filters against a paginatable source bypass the cache entirely so
        // enough matching items can be accumulated via live pagination.
        let skip_cache = has_filters && self.registry.supports_pagination(&id);

        let now = now_ms();
        let mut cached: Option<CacheEntry> = None;

        if !skip_cache {
            cached = match self.cache.get(&id).await {
                Ok(entry) => entry,
                Err(error) => {
                    // Unavailable cache counts as cache-absent.
                    warn!(%id, ?error, "cache read failed");
                    None
                }
            };

            if let Some(entry) = &cached {
                let age = now - entry.updated_at;
                let interval = self.registry.refresh_interval_ms(&id).unwrap_or(0);

                if age < interval {
                    counter!("serve_cache_fresh_total").increment(1);
                    return Ok(SourceResponse {
                        status: ResponseStatus::Success,
                        id,
                        updated_time: now,
                        items: present_cached(&entry.items, rules, self.config.limits.target_items),
                    });
                }

                if age < self.config.cache_ttl_ms && !(opts.latest && opts.can_force_refresh) {
                    counter!("serve_cache_stale_total").increment(1);
                    return Ok(SourceResponse {
                        status: ResponseStatus::Cache,
                        id,
                        updated_time: entry.updated_at,
                        items: present_cached(&entry.items, rules, self.config.limits.target_items),
                    });
                }
            }
        }

        let fetched = self.must_fetch(&id, rules, has_filters).await;

        match fetched {
            Ok((items, from_pagination)) => {
                // Only non-paginated results are cache-eligible; filtered
                // paginated runs are request-scoped.
                if !from_pagination && !items.is_empty() {
                    self.persist(&id, items.clone()).await;
                }
                info!(%id, filtered = has_filters, "fetched latest");
                Ok(SourceResponse {
                    status: ResponseStatus::Success,
                    id,
                    updated_time: now,
                    items,
                })
            }
            Err(error) => {
                counter!("upstream_fetch_errors_total").increment(1);
                if let Some(entry) = cached {
                    warn!(%id, %error, "live fetch failed, serving stale cache");
                    counter!("serve_fallback_total").increment(1);
                    return Ok(SourceResponse {
                        status: ResponseStatus::Cache,
                        id,
                        updated_time: entry.updated_at,
                        items: present_cached(&entry.items, rules, self.config.limits.target_items),
                    });
                }
                Err(error)
            }
        }
    }

    async fn must_fetch(
        &self,
        id: &str,
        rules: &[FilterRule],
        has_filters: bool,
    ) -> Result<(Vec<ContentItem>, bool), ServeError> {
        if has_filters {
            let result = fetch_with_filter(&self.registry, id, rules, &self.config.limits).await?;
            return Ok((result.items, result.from_pagination));
        }
        let Some(getter) = self.registry.plain_getter(id) else {
            return Err(ServeError::NoGetter(id.to_string()));
        };
        let started = std::time::Instant::now();
        let mut items = getter
            .fetch()
            .await
            .map_err(|e| ServeError::upstream(id, e))?;
        metrics::histogram!("upstream_fetch_ms").record(started.elapsed().as_secs_f64() * 1_000.0);
        items.truncate(self.config.limits.target_items);
        Ok((items, false))
    }

    /// Cache write: deferred to the runtime by default so persistence
    /// latency and failures stay off the response path.
    async fn persist(&self, id: &str, items: Vec<ContentItem>) {
        if self.config.defer_cache_writes {
            let cache = self.cache.clone();
            let id = id.to_string();
            tokio::spawn(async move {
                if let Err(error) = cache.set(&id, items).await {
                    warn!(%id, ?error, "deferred cache write failed");
                }
            });
        } else if let Err(error) = self.cache.set(id, items).await {
            warn!(id, ?error, "cache write failed");
        }
    }
}

fn present_cached(items: &[ContentItem], rules: &[FilterRule], target: usize) -> Vec<ContentItem> {
    if rules.is_empty() {
        return items.to_vec();
    }
    let mut filtered = apply_filters(items, rules);
    filtered.truncate(target);
    filtered
}
