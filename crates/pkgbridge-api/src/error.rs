//! API error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced to HTTP clients. Upstream failures are contained at
/// this boundary; callers only ever see a plain status code, never an
/// upstream error body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream probe failed: {0}")]
    Upstream(#[from] pkgbridge_proxy::ProxyError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(resource) => {
                debug!("Couldn't find resource {}", resource);
                StatusCode::NOT_FOUND.into_response()
            }
            // A failed probe is indistinguishable from "no matching
            // candidate" as far as the caller is concerned.
            ApiError::Upstream(e) => {
                debug!("Upstream probe failed: {}", e);
                StatusCode::NOT_FOUND.into_response()
            }
        }
    }
}
