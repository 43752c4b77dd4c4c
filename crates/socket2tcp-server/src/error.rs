//! Server error types.

use std::io;
use std::time::Duration;

use socket2tcp_core::{ERROR_BIND, ERROR_CONFIG, ERROR_DIAL, ERROR_RELAY, ERROR_TIMEOUT};

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config: {0}")]
    Config(String),
    #[error("bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("dial {remote}: {source}")]
    Dial { remote: String, source: io::Error },
    #[error("dial {remote}: timed out after {timeout:?}")]
    DialTimeout { remote: String, timeout: Duration },
    #[error("relay: {0}")]
    Relay(io::Error),
}

impl ServerError {
    /// Get the error type string for logging.
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Config(_) => ERROR_CONFIG,
            ServerError::Bind { .. } => ERROR_BIND,
            ServerError::Dial { .. } => ERROR_DIAL,
            ServerError::DialTimeout { .. } => ERROR_TIMEOUT,
            ServerError::Relay(_) => ERROR_RELAY,
        }
    }
}
