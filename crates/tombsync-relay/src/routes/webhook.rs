//! Webhook handler
//!
//! Only `POST` does anything; other methods answer 200 with an empty body.
//! A decoded delete is dispatched on its own task so that an aborted call
//! does not cancel deletions already in flight.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
};
use tombsync_core::Error;
use tracing::{debug, error, warn, Instrument};

use crate::events::{decode, DecodeResult};
use crate::metrics;
use crate::routes::error_response;
use crate::server::AppState;

/// Handle one webhook call
pub async fn handle_webhook(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() != Method::POST {
        debug!(method = %request.method(), "Ignoring non-POST request");
        return StatusCode::OK.into_response();
    }

    let body = match to_bytes(request.into_body(), state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            warn!("unable to read the body; {}", e);
            metrics::record_webhook("unreadable");
            return error_response(&Error::BodyRead(e.to_string()));
        }
    };

    let result = decode(&body);
    metrics::record_webhook(result.verdict());

    match result {
        DecodeResult::Actionable(intent) => {
            let dispatcher = state.dispatcher.clone();
            let task = tokio::spawn(
                async move { dispatcher.dispatch(&intent).await }.in_current_span(),
            );

            // Failures stay in the logs; the source event already happened
            if let Err(e) = task.await {
                error!("Deletion dispatch task failed: {}", e);
            }
            StatusCode::OK.into_response()
        }
        DecodeResult::Ignore => StatusCode::OK.into_response(),
        DecodeResult::Malformed(reason) => {
            warn!("unable to decode the body; {}", reason);
            error_response(&Error::MalformedNotification(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{body::to_bytes, http::header::AUTHORIZATION, Router};
    use serde_json::{json, Value};
    use tombsync_core::RelayConfig;
    use tombsync_store::StoreError;
    use tokio::sync::Notify;
    use tower::util::ServiceExt;

    use super::*;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::server::build_router;
    use crate::testing::{registry_of, RecordingStore};

    struct Harness {
        app: Router,
        stores: Vec<Arc<RecordingStore>>,
    }

    fn harness(stores: Vec<Arc<RecordingStore>>, token: Option<&str>, dry_run: bool) -> Harness {
        let mut config = RelayConfig::default();
        config.auth.token = token.map(String::from);
        config.replication.dry_run = dry_run;

        let state = AppState::new(&config, Arc::new(registry_of(&stores)));
        Harness {
            app: build_router(state),
            stores,
        }
    }

    fn healthy(n: usize) -> Vec<Arc<RecordingStore>> {
        (0..n).map(|_| Arc::new(RecordingStore::new())).collect()
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(body.into())
            .unwrap()
    }

    fn noop_event(bucket: &str, key: &str) -> Value {
        json!({
            "EventName": "s3:ObjectRemoved:NoOP",
            "Records": [{"s3": {"bucket": {"name": bucket}, "object": {"key": key}}}]
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    fn total_calls(stores: &[Arc<RecordingStore>]) -> usize {
        stores.iter().map(|s| s.calls().len()).sum()
    }

    #[tokio::test]
    async fn test_noop_event_deletes_on_every_target() {
        let h = harness(healthy(3), None, false);

        let (status, body) = send(&h.app, post(noop_event("photos", "cat.png").to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        for store in &h.stores {
            let calls = store.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].bucket, "photos");
            assert_eq!(calls[0].key, "cat.png");
            assert_eq!(calls[0].version_id, None);
        }
    }

    #[tokio::test]
    async fn test_other_events_do_nothing() {
        let h = harness(healthy(2), None, false);

        let mut event = noop_event("photos", "cat.png");
        event["EventName"] = json!("s3:ObjectRemoved:Delete");
        let (status, _) = send(&h.app, post(event.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_api_log_soft_delete_does_nothing() {
        let h = harness(healthy(2), None, false);
        let entry = json!({
            "api": {"name": "DeleteObject", "statusCode": 204, "bucket": "b", "object": "k"},
            "responseHeader": {"x-amz-delete-marker": "true", "x-amz-version-id": "v9"}
        });

        let (status, _) = send(&h.app, post(entry.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_api_log_hard_delete_is_replicated() {
        let h = harness(healthy(2), None, false);
        let entry = json!({
            "api": {"name": "DeleteObject", "statusCode": 204, "bucket": "b", "object": "dir/k"},
            "responseHeader": {},
            "requestQuery": {"versionId": "v3"}
        });

        let (status, _) = send(&h.app, post(entry.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        for store in &h.stores {
            assert_eq!(store.calls()[0].version_id.as_deref(), Some("v3"));
        }
    }

    #[tokio::test]
    async fn test_non_post_methods_are_accepted_without_effect() {
        let h = harness(healthy(1), None, false);

        for method in [Method::GET, Method::PUT, Method::DELETE, Method::HEAD] {
            let request = Request::builder()
                .method(method.clone())
                .uri("/anything")
                .body(Body::from(noop_event("b", "k").to_string()))
                .unwrap();
            let (status, body) = send(&h.app, request).await;
            assert_eq!(status, StatusCode::OK, "{}", method);
            assert!(body.is_empty());
        }
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_missing_token_rejected_before_parsing() {
        let h = harness(healthy(1), Some("Bearer s3cr3t"), false);

        // Not even JSON: a parse attempt would answer with a decode error
        let (status, body) = send(&h.app, post("{{{ definitely not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "authorization header missing\n");
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_wrong_token_rejected_for_any_method() {
        let h = harness(healthy(1), Some("s3cr3t"), false);

        let request = Request::builder()
            .method(Method::GET)
            .uri("/")
            .header(AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bearer_form_of_bare_token_is_rejected() {
        let h = harness(healthy(1), Some("s3cr3t"), false);

        let mut request = post(noop_event("b", "k").to_string());
        request
            .headers_mut()
            .insert(AUTHORIZATION, "Bearer s3cr3t".parse().unwrap());
        let (status, body) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "authorization header missing\n");
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_matching_token_is_accepted() {
        let h = harness(healthy(1), Some("Bearer s3cr3t"), false);

        let mut request = post(noop_event("b", "k").to_string());
        request
            .headers_mut()
            .insert(AUTHORIZATION, "Bearer s3cr3t".parse().unwrap());
        let (status, _) = send(&h.app, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(total_calls(&h.stores), 1);
    }

    #[tokio::test]
    async fn test_wrong_typed_field_is_a_client_error() {
        let h = harness(healthy(1), None, false);
        let entry = json!({"api": {"name": 204, "statusCode": 204}});

        let (status, body) = send(&h.app, post(entry.to_string())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("malformed notification: invalid `api`"), "{}", body);
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_client_error() {
        let h = harness(healthy(1), None, false);

        let (status, body) = send(&h.app, post("not json")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("malformed notification"));
    }

    #[tokio::test]
    async fn test_oversized_body_is_a_client_error() {
        let h = harness(healthy(1), None, false);
        let huge = vec![b' '; tombsync_core::MAX_BODY_BYTES + 1];

        let (status, body) = send(&h.app, post(huge)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.starts_with("error reading request body"));
    }

    #[tokio::test]
    async fn test_one_failing_target_still_succeeds() {
        let stores = vec![
            Arc::new(RecordingStore::new()),
            Arc::new(RecordingStore::failing(StoreError::Transport(
                "connection refused".into(),
            ))),
            Arc::new(RecordingStore::new()),
        ];
        let h = harness(stores, None, false);

        let (status, _) = send(&h.app, post(noop_event("photos", "cat.png").to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(h.stores.iter().all(|s| s.calls().len() == 1));
    }

    #[tokio::test]
    async fn test_dropped_request_does_not_cancel_deletion() {
        let gate = Arc::new(Notify::new());
        let h = harness(vec![Arc::new(RecordingStore::gated(gate.clone()))], None, false);

        // The handler spawns the dispatch on its first poll, then waits on the gate
        let call = h
            .app
            .clone()
            .oneshot(post(noop_event("photos", "cat.png").to_string()));
        assert!(tokio::time::timeout(Duration::from_millis(50), call)
            .await
            .is_err());
        assert_eq!(total_calls(&h.stores), 0);

        gate.notify_one();

        tokio::time::timeout(Duration::from_secs(5), async {
            while total_calls(&h.stores) == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("deletion finished after the caller went away");
        assert_eq!(h.stores[0].calls()[0].key, "cat.png");
    }

    #[tokio::test]
    async fn test_dry_run_reports_success_without_deleting() {
        let h = harness(healthy(2), None, true);

        let (status, _) = send(&h.app, post(noop_event("photos", "cat.png").to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(total_calls(&h.stores), 0);
    }

    #[tokio::test]
    async fn test_responses_carry_request_id() {
        let h = harness(healthy(1), Some("t"), false);

        let response = h.app.clone().oneshot(post("{}")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let id = response.headers().get(REQUEST_ID_HEADER).unwrap();
        assert_eq!(id.len(), 32);
    }
}
