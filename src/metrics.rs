use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_serve_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("serve_requests_total", "Requests handled by /api/s.");
        describe_counter!(
            "serve_cache_fresh_total",
            "Responses served from the fresh cache tier."
        );
        describe_counter!(
            "serve_cache_stale_total",
            "Responses served from the stale-but-acceptable cache tier."
        );
        describe_counter!(
            "serve_fallback_total",
            "Responses served from cache after a failed live fetch."
        );
        describe_counter!(
            "upstream_fetch_errors_total",
            "Source getter or paginated getter failures."
        );
        describe_counter!(
            "fetch_pages_total",
            "Upstream pages fetched by filtered pagination runs."
        );
        describe_histogram!("upstream_fetch_ms", "Plain upstream fetch time in milliseconds.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize Prometheus recorder and expose a static gauge for the
    /// global cache TTL.
    pub fn init(cache_ttl_ms: u64) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        gauge!("source_cache_ttl_ms").set(cache_ttl_ms as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
