//! Authentication middleware for the webhook endpoint
//!
//! When a token is configured, the `Authorization` header must carry it
//! verbatim before the request body is even read.

use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::Response,
};
use tombsync_core::Error;
use tracing::warn;

use crate::metrics;
use crate::routes::error_response;
use crate::server::AppState;

/// Reject requests whose `Authorization` header does not match the token
pub async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(value) if token_matches(expected, value) => next.run(request).await,
        _ => {
            warn!(
                method = %request.method(),
                path = %request.uri().path(),
                "Rejected webhook call with missing or invalid authorization"
            );
            metrics::record_webhook("unauthorized");
            error_response(&Error::AuthRejected)
        }
    }
}

/// Whether a presented header value satisfies the configured token
pub fn token_matches(expected: &str, provided: &str) -> bool {
    provided == expected
}
