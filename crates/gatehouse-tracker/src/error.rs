// error.rs — Error types for tracker client operations.

use thiserror::Error;

/// Errors that can occur while talking to the remote tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The HTTP request itself failed (connection, TLS, timeout).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker API returned a non-success status.
    #[error("tracker API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The referenced issue does not exist on the tracker.
    #[error("unknown issue #{0}")]
    UnknownIssue(u64),

    /// The configured token environment variable is unset or empty.
    #[error("missing tracker token: environment variable {0} is not set")]
    MissingToken(String),

    /// Failed to decode a tracker API response.
    #[error("malformed tracker response: {0}")]
    Decode(#[from] serde_json::Error),
}
