//! Deletion intents

use serde::{Deserialize, Serialize};
use std::fmt;

/// "This exact object generation must be removed everywhere."
///
/// Built from one inbound notification and consumed by one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionIntent {
    pub bucket: String,
    pub object_key: String,
    /// `None` targets the current (or unversioned) state of the object
    pub version_id: Option<String>,
}

impl DeletionIntent {
    pub fn new(
        bucket: impl Into<String>,
        object_key: impl Into<String>,
        version_id: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            object_key: object_key.into(),
            version_id: version_id.filter(|v| !v.is_empty()),
        }
    }

    /// Both bucket and key must be known before anything is sent to a remote
    pub fn is_dispatchable(&self) -> bool {
        !self.bucket.is_empty() && !self.object_key.is_empty()
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }
}

impl fmt::Display for DeletionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version_id {
            Some(version) => write!(f, "{}/{}; version: {}", self.bucket, self.object_key, version),
            None => write!(f, "{}/{}", self.bucket, self.object_key),
        }
    }
}
