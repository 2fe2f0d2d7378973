//! Tombsync Core Library
//!
//! Configuration, error taxonomy and domain types shared by the delete
//! replication relay.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::RelayConfig;
pub use error::{Error, Result};

/// Tombsync version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default signing region for remote targets
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default bind address for the webhook listener
pub const DEFAULT_ADDRESS: &str = ":8080";

/// Event name the source emits for a replicated delete
pub const NOOP_REMOVE_EVENT: &str = "s3:ObjectRemoved:NoOP";

/// Largest webhook body accepted (1 MiB)
pub const MAX_BODY_BYTES: usize = 1024 * 1024;
