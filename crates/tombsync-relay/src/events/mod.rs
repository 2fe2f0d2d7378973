//! Notification handling
//!
//! - Decoding webhook bodies into deletion intents
//! - Dispatching intents to every remote target

mod decoder;
mod dispatcher;

pub use decoder::{decode, detect_schema, DecodeResult};
pub use dispatcher::{
    DeletionDispatcher, DispatchOutcome, TargetOutcome, TargetResult,
};
