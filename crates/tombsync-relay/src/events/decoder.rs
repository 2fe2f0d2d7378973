//! Notification Decoder
//!
//! Turns a webhook body into a [`DecodeResult`]. The schema is detected per
//! request from the top-level keys:
//! - `api` selects the API log schema
//! - `EventName` / `Records` select the bucket event schema
//!
//! Fields are type-checked one section at a time, so a wrong-typed field in
//! a section that is never consulted (for example `Records` of an event we
//! ignore anyway) does not make the request fail.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tombsync_core::types::{
    ApiCall, DeletionIntent, LegacyRecord, NotificationSchema, RequestQuery,
    API_LOG_API_KEY, API_LOG_REQUEST_QUERY_KEY, API_LOG_RESPONSE_HEADER_KEY,
    LEGACY_EVENT_NAME_KEY, LEGACY_RECORDS_KEY, SOFT_DELETE_HEADERS,
};
use tombsync_core::NOOP_REMOVE_EVENT;
use tracing::debug;

/// Outcome of decoding one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// Replicate this delete
    Actionable(DeletionIntent),
    /// Well-formed but nothing to do
    Ignore,
    /// The body could not be understood; the reason is safe to return
    Malformed(String),
}

impl DecodeResult {
    pub fn verdict(&self) -> &'static str {
        match self {
            DecodeResult::Actionable(_) => "actionable",
            DecodeResult::Ignore => "ignored",
            DecodeResult::Malformed(_) => "malformed",
        }
    }
}

type Decoded<T> = Result<T, String>;

/// Decode a raw webhook body
pub fn decode(raw_body: &[u8]) -> DecodeResult {
    let value: Value = match serde_json::from_slice(raw_body) {
        Ok(value) => value,
        Err(e) => return DecodeResult::Malformed(format!("invalid JSON: {}", e)),
    };

    let Value::Object(envelope) = value else {
        return DecodeResult::Malformed("notification must be a JSON object".into());
    };

    let Some(schema) = detect_schema(&envelope) else {
        debug!("Notification matches no known schema, ignoring");
        return DecodeResult::Ignore;
    };

    let decoded = match schema {
        NotificationSchema::Legacy => decode_legacy(&envelope),
        NotificationSchema::ApiLog => decode_api_log(&envelope),
    };

    match decoded {
        Ok(Some(intent)) if intent.is_dispatchable() => DecodeResult::Actionable(intent),
        Ok(Some(intent)) => {
            debug!(%schema, ?intent, "Notification lacks bucket or key, ignoring");
            DecodeResult::Ignore
        }
        Ok(None) => DecodeResult::Ignore,
        Err(reason) => DecodeResult::Malformed(reason),
    }
}

/// Which schema an envelope uses, if any
pub fn detect_schema(envelope: &Map<String, Value>) -> Option<NotificationSchema> {
    if envelope.contains_key(API_LOG_API_KEY) {
        Some(NotificationSchema::ApiLog)
    } else if envelope.contains_key(LEGACY_EVENT_NAME_KEY)
        || envelope.contains_key(LEGACY_RECORDS_KEY)
    {
        Some(NotificationSchema::Legacy)
    } else {
        None
    }
}

fn decode_legacy(envelope: &Map<String, Value>) -> Decoded<Option<DeletionIntent>> {
    let event_name: Option<String> = field(envelope, LEGACY_EVENT_NAME_KEY)?;
    if event_name.as_deref() != Some(NOOP_REMOVE_EVENT) {
        debug!(event = ?event_name, "Ignoring event");
        return Ok(None);
    }

    // Only the first record is read, so only the first record is type-checked
    let records: Vec<Value> = field(envelope, LEGACY_RECORDS_KEY)?.unwrap_or_default();
    let first = records
        .first()
        .ok_or_else(|| "missing records in the request body".to_string())?;
    let record = LegacyRecord::deserialize(first)
        .map_err(|e| format!("invalid `{}[0]`: {}", LEGACY_RECORDS_KEY, e))?;
    let s3 = record
        .s3
        .ok_or_else(|| "missing s3 data in the request body".to_string())?;

    let bucket = s3.bucket.and_then(|b| b.name).unwrap_or_default();
    let (key, version_id) = s3
        .object
        .map(|o| (o.key.unwrap_or_default(), o.version_id))
        .unwrap_or_default();

    Ok(Some(DeletionIntent::new(bucket, key, version_id)))
}

fn decode_api_log(envelope: &Map<String, Value>) -> Decoded<Option<DeletionIntent>> {
    let api: ApiCall = field(envelope, API_LOG_API_KEY)?.unwrap_or_default();
    if !api.is_completed_delete() {
        debug!(api = ?api.name, status = ?api.status_code, "Ignoring API call");
        return Ok(None);
    }

    let response_header: Map<String, Value> =
        field(envelope, API_LOG_RESPONSE_HEADER_KEY)?.unwrap_or_default();
    if is_soft_delete(&response_header) {
        debug!("Ignoring delete marker / versioned delete");
        return Ok(None);
    }

    let query: RequestQuery = field(envelope, API_LOG_REQUEST_QUERY_KEY)?.unwrap_or_default();

    Ok(Some(DeletionIntent::new(
        api.bucket.unwrap_or_default(),
        api.object.unwrap_or_default(),
        query.version_id,
    )))
}

fn is_soft_delete(response_header: &Map<String, Value>) -> bool {
    response_header.keys().any(|name| {
        SOFT_DELETE_HEADERS
            .iter()
            .any(|soft| name.eq_ignore_ascii_case(soft))
    })
}

/// Deserialize one top-level field; `null` and absence both give `None`
fn field<T: DeserializeOwned>(envelope: &Map<String, Value>, key: &str) -> Decoded<Option<T>> {
    match envelope.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| format!("invalid `{}`: {}", key, e)),
    }
}
