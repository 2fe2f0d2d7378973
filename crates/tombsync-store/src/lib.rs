//! Tombsync Store - clients for remote object storage
//!
//! The relay only ever needs one capability from a remote site: remove an
//! object (optionally a specific version of it). [`ObjectStore`] is that
//! capability; [`S3Client`] implements it against any S3-compatible endpoint
//! using path-style requests signed with AWS Signature V4.

mod client;
mod error;
pub mod signing;

pub use client::{ClientOptions, S3Client};
pub use error::{StoreError, StoreResult};

use async_trait::async_trait;

/// A remote site objects can be deleted from
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Delete `bucket/key`. With `version_id` the given version is removed
    /// permanently, otherwise the current state of the object.
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<()>;
}
