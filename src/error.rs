// src/error.rs
//! Request-level error taxonomy. Locally recoverable conditions (bad filter
//! JSON, cache unavailability) never reach this type; everything here
//! surfaces as a uniform HTTP 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServeError {
    /// Unknown source id after (single-hop) redirect resolution.
    #[error("invalid source id: {0}")]
    InvalidSource(String),

    /// Source registered without any getter.
    #[error("no getter for source: {0}")]
    NoGetter(String),

    /// A source getter or paginated getter call failed and no cache entry
    /// was available to fall back on.
    #[error("upstream fetch failed for {id}: {source}")]
    Upstream {
        id: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ServeError {
    pub fn upstream(id: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Upstream {
            id: id.into(),
            source,
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "message": self.to_string() });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_source() {
        let e = ServeError::InvalidSource("doesnotexist".into());
        assert_eq!(e.to_string(), "invalid source id: doesnotexist");

        let e = ServeError::upstream("reddit", anyhow::anyhow!("connection reset"));
        assert!(e.to_string().contains("reddit"));
        assert!(e.to_string().contains("connection reset"));
    }
}
