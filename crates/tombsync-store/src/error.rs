//! Store error types

use std::time::Duration;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by a remote object store
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Remote returned {status}: {code}: {message}")]
    Status {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Whether the remote answered at all
    pub fn is_remote(&self) -> bool {
        matches!(self, StoreError::Status { .. })
    }
}
