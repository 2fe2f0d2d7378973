//! Core types for Tombsync

mod intent;
mod notification;
mod target;

pub use intent::*;
pub use notification::*;
pub use target::*;
