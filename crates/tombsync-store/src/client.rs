//! S3-compatible client for remote targets
//!
//! Each remote site gets its own long-lived client with:
//! - TLS verification that can be switched off per site
//! - A per-call timeout
//! - Path-style URLs signed with Signature V4

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quick_xml::de::from_str;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Deserialize;
use tracing::debug;

use tombsync_core::config::ClientConfig;
use tombsync_core::types::RemoteTarget;
use tombsync_core::utils::truncate_for_log;

use crate::error::{StoreError, StoreResult};
use crate::signing::{
    amz_date, authorization_header, canonical_query_string, uri_encode, uri_encode_key,
    SignableRequest, SigningCredentials, EMPTY_PAYLOAD_SHA256,
};
use crate::ObjectStore;

/// Header asking MinIO-compatible servers to delete regardless of object lock
pub const FORCE_DELETE_HEADER: &str = "x-minio-force-delete";

/// Client options shared by every target
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-call timeout
    pub timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Send the force-delete header
    pub force_delete: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            force_delete: true,
        }
    }
}

impl From<&ClientConfig> for ClientOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            force_delete: config.force_delete,
            ..Self::default()
        }
    }
}

/// A fully-resolved request target
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectRequest {
    pub url: String,
    pub host: String,
    pub canonical_uri: String,
    pub query: Vec<(String, String)>,
}

/// S3 client bound to one remote target
pub struct S3Client {
    target: RemoteTarget,
    http: Client,
    options: ClientOptions,
    credentials: SigningCredentials,
}

impl S3Client {
    /// Create a client for a validated target
    pub fn new(target: RemoteTarget, options: ClientOptions) -> StoreResult<Self> {
        let mut builder = ClientBuilder::new()
            .timeout(options.timeout)
            .connect_timeout(options.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90));

        if target.insecure_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let credentials =
            SigningCredentials::s3(&target.access_key, &target.secret_key, &target.region);

        Ok(Self {
            target,
            http,
            options,
            credentials,
        })
    }

    pub(crate) fn object_request(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<ObjectRequest> {
        if bucket.is_empty() || key.is_empty() {
            return Err(StoreError::InvalidRequest(
                "bucket and key must not be empty".into(),
            ));
        }

        let endpoint = &self.target.endpoint;
        let host = self.target.host();
        let base_path = endpoint.path().trim_end_matches('/');

        let canonical_uri = format!(
            "{}/{}/{}",
            base_path,
            uri_encode(bucket),
            uri_encode_key(key)
        );

        let query: Vec<(String, String)> = version_id
            .filter(|v| !v.is_empty())
            .map(|v| vec![("versionId".to_string(), v.to_string())])
            .unwrap_or_default();

        let mut url = format!("{}://{}{}", endpoint.scheme(), host, canonical_uri);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query_string(&query));
        }

        Ok(ObjectRequest {
            url,
            host,
            canonical_uri,
            query,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> StoreError {
        if err.is_timeout() {
            StoreError::Timeout(self.options.timeout)
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<()> {
        let request = self.object_request(bucket, key, version_id)?;
        let now = Utc::now();

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), request.host.clone());
        headers.insert(
            "x-amz-content-sha256".to_string(),
            EMPTY_PAYLOAD_SHA256.to_string(),
        );
        headers.insert("x-amz-date".to_string(), amz_date(&now));
        if self.options.force_delete {
            headers.insert(FORCE_DELETE_HEADER.to_string(), "true".to_string());
        }

        let authorization = authorization_header(
            &SignableRequest {
                method: "DELETE",
                canonical_uri: &request.canonical_uri,
                query: &request.query,
                headers: &headers,
                payload_hash: EMPTY_PAYLOAD_SHA256,
            },
            &self.credentials,
            &now,
        );

        debug!(
            target_name = %self.target.name,
            url = %request.url,
            "Sending DeleteObject"
        );

        // reqwest derives Host from the URL itself
        let mut builder = self.http.delete(&request.url);
        for (name, value) in headers.iter().filter(|(name, _)| name.as_str() != "host") {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .header("authorization", authorization)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

/// Body of an S3 error response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct S3ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

fn status_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: S3ErrorBody = from_str(body).unwrap_or_default();

    let code = parsed
        .code
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());
    let message = parsed
        .message
        .unwrap_or_else(|| truncate_for_log(body, 200));

    StoreError::Status {
        status: status.as_u16(),
        code,
        message,
    }
}
