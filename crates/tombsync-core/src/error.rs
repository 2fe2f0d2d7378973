//! Error types for Tombsync

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    // Startup errors
    #[error("REMOTE_{field}_{target} not set")]
    MissingCredential { target: String, field: &'static str },

    #[error("no remote sites provided")]
    NoTargets,

    #[error("invalid endpoint for remote site {target}: {reason}")]
    InvalidEndpoint { target: String, reason: String },

    #[error("unable to create s3 client for {target}: {reason}")]
    ClientSetup { target: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unable to listen on {address}: {reason}")]
    Bind { address: String, reason: String },

    // Request errors
    #[error("authorization header missing")]
    AuthRejected,

    #[error("error reading request body: {0}")]
    BodyRead(String),

    #[error("malformed notification: {0}")]
    MalformedNotification(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::MissingCredential { .. } => "MissingCredential",
            Error::NoTargets => "NoTargets",
            Error::InvalidEndpoint { .. } => "InvalidEndpoint",
            Error::ClientSetup { .. } => "ClientSetup",
            Error::Config(_) => "InvalidConfiguration",
            Error::Bind { .. } => "BindFailed",
            Error::AuthRejected => "AuthRejected",
            Error::BodyRead(_) => "BodyRead",
            Error::MalformedNotification(_) => "MalformedNotification",
            Error::Io(_) => "InternalError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Error::AuthRejected | Error::BodyRead(_) | Error::MalformedNotification(_) => 400,
            _ => 500,
        }
    }

    /// Whether the error can only happen before the listener starts serving
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential { .. }
                | Error::NoTargets
                | Error::InvalidEndpoint { .. }
                | Error::ClientSetup { .. }
                | Error::Config(_)
                | Error::Bind { .. }
        )
    }
}
