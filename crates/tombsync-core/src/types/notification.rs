//! Inbound notification shapes
//!
//! The source server can describe a delete in two ways:
//! - a bucket event (`EventName` + `Records[]`), as sent by bucket
//!   notification webhooks
//! - an API log entry (`api` + `responseHeader` + `requestQuery`), as sent
//!   by audit webhooks
//!
//! Every field is optional here. A field that is present with the wrong JSON
//! type fails deserialization instead of being silently dropped.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Top-level key of the bucket event schema
pub const LEGACY_EVENT_NAME_KEY: &str = "EventName";
pub const LEGACY_RECORDS_KEY: &str = "Records";

/// Top-level keys of the API log schema
pub const API_LOG_API_KEY: &str = "api";
pub const API_LOG_RESPONSE_HEADER_KEY: &str = "responseHeader";
pub const API_LOG_REQUEST_QUERY_KEY: &str = "requestQuery";

/// API name of a single-object delete
pub const DELETE_OBJECT_API: &str = "DeleteObject";

/// Status the source answers a completed delete with
pub const DELETE_OBJECT_STATUS: u16 = 204;

/// Response headers marking a soft delete in a versioned bucket
pub const SOFT_DELETE_HEADERS: [&str; 2] = ["x-amz-delete-marker", "x-amz-version-id"];

/// Which notification layout a request body used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSchema {
    Legacy,
    ApiLog,
}

impl NotificationSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::ApiLog => "api-log",
        }
    }
}

impl fmt::Display for NotificationSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Bucket event schema
// ============================================================================

/// One entry of `Records`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyRecord {
    #[serde(default)]
    pub s3: Option<LegacyS3Entity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyS3Entity {
    #[serde(default)]
    pub bucket: Option<LegacyBucket>,
    #[serde(default)]
    pub object: Option<LegacyObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegacyBucket {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyObject {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
}

// ============================================================================
// API log schema
// ============================================================================

/// The `api` section of an API log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCall {
    #[serde(default)]
    pub name: Option<String>,
    /// Any JSON number; only the delete status is meaningful
    #[serde(default)]
    pub status_code: Option<f64>,
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
}

impl ApiCall {
    pub fn is_completed_delete(&self) -> bool {
        self.name.as_deref() == Some(DELETE_OBJECT_API)
            && self.status_code == Some(f64::from(DELETE_OBJECT_STATUS))
    }
}

/// The `requestQuery` section of an API log entry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestQuery {
    #[serde(default)]
    pub version_id: Option<String>,
}
