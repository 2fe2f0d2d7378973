//! AWS Signature V4 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::trace;

/// SHA-256 of an empty payload
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Everything except the RFC 3986 unreserved characters
const URI_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Credentials and scope a request is signed with
#[derive(Clone)]
pub struct SigningCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub service: String,
}

impl SigningCredentials {
    pub fn s3(access_key: &str, secret_key: &str, region: &str) -> Self {
        Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
            region: region.to_string(),
            service: "s3".to_string(),
        }
    }
}

/// The parts of an HTTP request covered by the signature
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Already URI-encoded absolute path
    pub canonical_uri: &'a str,
    /// Raw (unencoded) query parameters
    pub query: &'a [(String, String)],
    /// Lower-case header names; every entry is signed
    pub headers: &'a BTreeMap<String, String>,
    pub payload_hash: &'a str,
}

/// `x-amz-date` value for a timestamp
pub fn amz_date(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Percent-encode one path segment or query component
pub fn uri_encode(value: &str) -> String {
    utf8_percent_encode(value, URI_ENCODE_SET).to_string()
}

/// Percent-encode an object key, keeping `/` separators
pub fn uri_encode_key(key: &str) -> String {
    key.split('/').map(uri_encode).collect::<Vec<_>>().join("/")
}

/// Canonical (sorted, encoded) query string
pub fn canonical_query_string(query: &[(String, String)]) -> String {
    let mut params: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k), uri_encode(v)))
        .collect();

    params.sort();

    params
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the `Authorization` header value for a request.
///
/// `headers` must already contain `x-amz-date` formatted from `timestamp`.
pub fn authorization_header(
    request: &SignableRequest<'_>,
    credentials: &SigningCredentials,
    timestamp: &DateTime<Utc>,
) -> String {
    let signed_headers = request
        .headers
        .keys()
        .cloned()
        .collect::<Vec<_>>()
        .join(";");

    let canonical_headers: String = request
        .headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method,
        request.canonical_uri,
        canonical_query_string(request.query),
        canonical_headers,
        signed_headers,
        request.payload_hash
    );

    trace!("Canonical request:\n{}", canonical_request);

    let date_stamp = timestamp.format("%Y%m%d").to_string();
    let credential_scope = format!(
        "{}/{}/{}/aws4_request",
        date_stamp, credentials.region, credentials.service
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(timestamp),
        credential_scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let k_date = hmac_sha256(
        format!("AWS4{}", credentials.secret_key).as_bytes(),
        date_stamp.as_bytes(),
    );
    let k_region = hmac_sha256(&k_date, credentials.region.as_bytes());
    let k_service = hmac_sha256(&k_region, credentials.service.as_bytes());
    let k_signing = hmac_sha256(&k_service, b"aws4_request");

    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{},SignedHeaders={},Signature={}",
        ALGORITHM, credentials.access_key, credential_scope, signed_headers, signature
    )
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    type HmacSha256 = Hmac<Sha256>;
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
