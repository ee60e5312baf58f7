//! HTTP boundary errors.
//!
//! Every failure leaving the API is one of three kinds and renders as the
//! fixed envelope `{error, details?}`: bad input (400), a missing provider
//! key (500), or an upstream failure (500, with the provider's payload or
//! message attached as `details`). Transient and permanent upstream
//! failures are treated identically; nothing is retried.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use crate::providers::UpstreamError;

/// An error a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid required input.
    #[error("{0}")]
    BadRequest(&'static str),

    /// A required provider API key is not configured.
    #[error("{0}")]
    Misconfigured(&'static str),

    /// An upstream call failed; `context` is the per-endpoint message the
    /// frontend displays.
    #[error("{context}")]
    Upstream {
        context: &'static str,
        source: UpstreamError,
    },
}

impl ApiError {
    /// Wrap an [`UpstreamError`] with an endpoint-specific message.
    pub fn upstream(context: &'static str) -> impl FnOnce(UpstreamError) -> Self {
        move |source| Self::Upstream { context, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Misconfigured(message) => {
                warn!(error = %message, "request rejected: provider not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": message }))
            }
            ApiError::Upstream { context, source } => {
                warn!(
                    provider = source.provider,
                    status = ?source.status,
                    error = %source,
                    "upstream call failed"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": context, "details": source.details() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_request_envelope() {
        let response = ApiError::BadRequest("Name and geo_json are required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_envelope_is_500() {
        let error = ApiError::upstream("Failed to fetch soil data")(UpstreamError::new(
            "agromonitoring",
            "connection refused",
        ));

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
