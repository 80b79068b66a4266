//! Errors raised by the admin API client outside a request outcome.

use gateway::RequestError;
use thiserror::Error;

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
#[error("Failed to build HTTP client: {0}")]
pub struct ClientBuildError(#[from] pub reqwest::Error);

/// Why a change-feed follower stopped without being asked to.
#[derive(Debug, Error)]
pub enum FollowError {
    /// A `_changes` request failed.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The server answered with a body that is not a change batch.
    #[error("Change feed response (status {status}) has no 'results' array")]
    MalformedBatch {
        /// HTTP status of the offending response.
        status: u16,
    },

    /// The follower task panicked or was aborted by the runtime.
    #[error("Change feed follower task failed: {0}")]
    Task(String),
}
