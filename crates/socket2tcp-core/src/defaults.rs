//! Default configuration values.
//!
//! Centralized default constants for use across all crates.

// ============================================================================
// Timeout Defaults
// ============================================================================

/// Default timeout for dialing the remote target, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default wait for in-flight connections after the accept loop stops.
/// Zero means the server returns without waiting.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 0;
/// Pause after a transient accept error before accepting again, in milliseconds.
pub const DEFAULT_ACCEPT_RETRY_DELAY_MS: u64 = 10;

// ============================================================================
// Buffer/Size Defaults
// ============================================================================

/// Default relay buffer size per direction (16 KiB).
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 16 * 1024;
/// Smallest accepted relay buffer size.
pub const MIN_RELAY_BUFFER_SIZE: usize = 1024;
/// Largest accepted relay buffer size.
pub const MAX_RELAY_BUFFER_SIZE: usize = 1024 * 1024;
/// Default listen backlog for TCP endpoints.
pub const DEFAULT_CONNECTION_BACKLOG: u32 = 1024;
