// src/api.rs
//! HTTP surface: the aggregation endpoint plus health.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::config::ServiceConfig;
use crate::error::ServeError;
use crate::filter::parse_filter_rules;
use crate::orchestrator::{FetchOrchestrator, RequestOptions};
use crate::types::SourceResponse;

pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<FetchOrchestrator>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/s", get(serve_source))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Deserialize)]
struct SourceQuery {
    id: Option<String>,
    /// JSON-encoded array of filter rules; anything unparseable counts as
    /// no filters.
    filter: Option<String>,
    /// Any value except an absent parameter or the literal "false" means
    /// true.
    latest: Option<String>,
}

async fn serve_source(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
    headers: HeaderMap,
) -> Result<Json<SourceResponse>, ServeError> {
    let id = query.id.unwrap_or_default();
    let latest = matches!(query.latest.as_deref(), Some(v) if v != "false");
    let rules = parse_filter_rules(query.filter.as_deref());

    let opts = RequestOptions {
        latest,
        can_force_refresh: can_force_refresh(state.orchestrator.config(), &headers),
    };
    let response = state.orchestrator.serve(&id, &rules, &opts).await?;
    Ok(Json(response))
}

/// A caller may force a refresh when no refresh token is configured (open
/// mode) or when the request carries the configured token.
fn can_force_refresh(config: &ServiceConfig, headers: &HeaderMap) -> bool {
    match &config.refresh_token {
        None => true,
        Some(expected) => headers
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected),
    }
}
