//! Error types for the gateway admin console.
//!
//! [`RequestError`] is the failure half of every request outcome: it is a
//! value delivered to the caller, never a panic, and it is never retried.
//! [`ConsoleError`] covers problems detected before any request is issued
//! (configuration, malformed input).

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Request failures
// ---------------------------------------------------------------------------

/// Why a request handle settled without a [`crate::Response`].
///
/// The three variants are mutually exclusive: a handle settles exactly once,
/// so a caller observes exactly one of them (or a success).
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum RequestError {
    /// The transport itself failed (connection refused, DNS failure, reset).
    ///
    /// No HTTP status is available.
    #[error("Transport error: {message}")]
    Transport {
        /// Description reported by the transport.
        message: String,
    },

    /// The server answered with a status outside `200..=299`.
    #[error("Request failed with status {status}: {message}")]
    Application {
        /// Reason phrase of the response status (e.g. `"Not Found"`).
        message: String,
        /// HTTP status code returned by the server.
        status: u16,
    },

    /// The caller cancelled the request before it settled.
    #[error("Request canceled")]
    Canceled,
}

impl RequestError {
    /// Returns `true` if the request was cancelled by the caller.
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }

    /// Returns the HTTP status carried by an application error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            Self::Transport { .. } | Self::Canceled => None,
        }
    }

    /// Returns the human-readable message, if the variant carries one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Transport { message } | Self::Application { message, .. } => Some(message),
            Self::Canceled => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Console-level errors
// ---------------------------------------------------------------------------

/// Errors raised before a request is issued.
///
/// Produced at configuration load time or while turning user input into
/// request arguments; the console never issues a request built from
/// invalid input.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The console configuration is invalid.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The admin server URL cannot be used as a base for API paths.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl {
        /// The offending URL as supplied.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The command line does not name a known command with its arguments.
    #[error("Usage error: {message}")]
    Usage {
        /// What was wrong with the arguments.
        message: String,
    },

    /// A document or user body supplied by the caller is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// An identifier supplied by the caller is empty or malformed.
    #[error("Invalid {kind}: '{value}'")]
    InvalidIdentifier {
        /// Identifier type name (e.g. `"DocumentId"`).
        kind: &'static str,
        /// The rejected value.
        value: String,
    },
}

// Arguments that are parsed as plain strings or paths cannot fail.
impl From<std::convert::Infallible> for ConsoleError {
    fn from(never: std::convert::Infallible) -> Self {
        match never {}
    }
}
