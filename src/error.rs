//! Error types for news-pager
//!
//! This module provides the error handling used throughout the loading pipeline:
//! - A single crate-wide [`Error`] enum with one variant per failure class
//! - A [`Result`] alias
//! - The [`ErrorBody`] payload the article API sends on non-2xx responses
//!
//! Cancellation is modelled as an error variant so it can travel through `?`, but it
//! is not a failure: callers check [`Error::is_cancelled`] and swallow it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for news-pager operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for news-pager
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base_url")
        key: Option<String>,
    },

    /// The server answered with a non-success status
    ///
    /// `message` is the server-provided `error` field when present, otherwise a
    /// synthesized `"Error <status>: <reason>"`.
    #[error("{message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Message suitable for display
        message: String,
    },

    /// Connectivity, DNS or transport-level failure
    #[error("{0}")]
    Network(String),

    /// Response body could not be decoded
    #[error("{0}")]
    Decode(String),

    /// The request was cancelled by its issuer
    #[error("request cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns true for the cancellation outcome
    ///
    /// Cancellation is the only error that must never reach the user.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Message shown in a user-facing notification
    pub fn user_message(&self) -> String {
        match self {
            Error::Network(msg) | Error::Decode(msg) if msg.is_empty() => {
                "Network error occurred".to_string()
            }
            other => other.to_string(),
        }
    }

    /// HTTP status for [`Error::Http`], `None` otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Decode(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}

/// Error payload returned by the article API on non-2xx responses
///
/// ```json
/// { "error": "db down" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// Human-readable error message
    pub error: String,
}

impl ErrorBody {
    /// Extract the server message from a raw body, if it follows the convention
    ///
    /// Empty messages are treated as absent so the caller falls back to a
    /// synthesized one.
    pub fn parse(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .map(|b| b.error)
            .filter(|msg| !msg.is_empty())
    }
}
