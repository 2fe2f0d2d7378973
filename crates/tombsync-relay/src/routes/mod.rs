//! Webhook routes

mod webhook;

pub use webhook::handle_webhook;

use axum::{
    http::{
        header::{CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS},
        StatusCode,
    },
    response::{IntoResponse, Response},
};
use tombsync_core::Error;

/// Plain-text error response
pub fn error_response(err: &Error) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        format!("{}\n", err),
    )
        .into_response()
}
