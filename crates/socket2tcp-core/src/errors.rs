//! Error type constants for logging.
//!
//! These constants provide consistent error classification across all crates.

/// Configuration error.
pub const ERROR_CONFIG: &str = "config";
/// Listening endpoint could not be bound.
pub const ERROR_BIND: &str = "bind";
/// Remote target could not be dialed.
pub const ERROR_DIAL: &str = "dial";
/// Timeout error.
pub const ERROR_TIMEOUT: &str = "timeout";
/// Genuine failure while relaying bytes.
pub const ERROR_RELAY: &str = "relay";
