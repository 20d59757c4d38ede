//! Error types for wall-ingest
//!
//! The taxonomy follows how failures propagate through a run:
//! - transport/API failures ([`Error::Network`], [`Error::Api`]) abort only the
//!   channel that hit them
//! - storage failures ([`Error::Database`], [`Error::Sqlx`], [`Error::Io`]) are
//!   fatal for the affected channel
//! - malformed attachments and duplicate ledger rows are not errors at all; they
//!   surface as [`PhotoOutcome::Skipped`](crate::types::PhotoOutcome) and
//!   [`InsertOutcome::AlreadyRecorded`](crate::types::InsertOutcome)

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for wall-ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wall-ingest
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "TOKEN_VK")
        key: Option<String>,
    },

    /// Ledger operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// The remote API answered with an error envelope
    #[error("remote API error {code} in {method}: {message}")]
    Api {
        /// API method that was called (e.g., "wall.get")
        method: String,
        /// Numeric error code reported by the API
        code: i64,
        /// Error message reported by the API
        message: String,
    },

    /// The remote API answered, but not with the shape we expected
    #[error("unexpected response from {method}: {reason}")]
    UnexpectedResponse {
        /// API method that was called
        method: String,
        /// What was wrong with the response
        reason: String,
    },

    /// Channel identifier resolved to nothing
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Writing a media artifact failed
    #[error("failed to write {}: {source}", path.display())]
    MediaWrite {
        /// File that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Invalid URL
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Ledger-related errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open the ledger database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Transaction could not be started or committed
    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

impl Error {
    /// Machine-readable error code, used in events and log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Api { .. } => "api_error",
            Error::UnexpectedResponse { .. } => "unexpected_response",
            Error::ChannelNotFound(_) => "channel_not_found",
            Error::MediaWrite { .. } => "media_write_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Url(_) => "invalid_url",
            Error::Serialization(_) => "serialization_error",
            Error::Other(_) => "internal_error",
        }
    }

    /// True for failures talking to the remote API (transport or API-level)
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::Network(_)
                | Error::Api { .. }
                | Error::UnexpectedResponse { .. }
                | Error::ChannelNotFound(_)
        )
    }

    /// True for failures of the ledger database or the media filesystem
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::Database(_) | Error::Sqlx(_) | Error::MediaWrite { .. } | Error::Io(_)
        )
    }
}
