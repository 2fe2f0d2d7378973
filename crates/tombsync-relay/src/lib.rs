//! Tombsync Relay
//!
//! Receives object-removal webhooks from a source object store and replays
//! each delete against every configured remote site.
//!
//! ```text
//! POST /  ──► require_token ──► decode ──► DeletionDispatcher ──► ObjectStore × N
//!                                 │
//!                                 └─ ignored / malformed ──► 200 / 400
//! ```

pub mod events;
pub mod metrics;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

pub use events::{decode, DecodeResult, DeletionDispatcher, DispatchOutcome};
pub use registry::TargetRegistry;
pub use server::{build_router, AppState, RelayServer};
