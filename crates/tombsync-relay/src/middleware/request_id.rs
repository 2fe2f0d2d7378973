//! Request correlation
//!
//! Every call gets an id that is attached to its log lines and echoed in
//! the `x-request-id` response header.

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tombsync_core::utils::generate_request_id;
use tracing::{info_span, Instrument};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn assign_request_id(request: Request<Body>, next: Next) -> Response {
    let request_id = generate_request_id();
    let span = info_span!("webhook", request_id = %request_id);
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
