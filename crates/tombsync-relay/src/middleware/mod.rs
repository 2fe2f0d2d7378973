//! Request middleware

mod auth;
mod request_id;

pub use auth::{require_token, token_matches};
pub use request_id::{assign_request_id, REQUEST_ID_HEADER};
