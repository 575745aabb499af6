// error.rs — Error types for the MCP gateway.

use thiserror::Error;

/// Errors that can occur while setting up or running the gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Failed to reach or authenticate against the remote tracker.
    #[error("tracker error: {0}")]
    Tracker(#[from] gatehouse_tracker::TrackerError),

    /// An I/O operation failed (config file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file did not parse.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}
