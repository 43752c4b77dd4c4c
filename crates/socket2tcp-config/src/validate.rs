//! Configuration validation logic.

use crate::Config;
use crate::defaults::{max_relay_buffer_size, min_relay_buffer_size};
use crate::loader::ConfigError;

/// Reject configurations the server cannot start with.
///
/// Runs before any socket is bound, so a missing socket or remote address
/// is reported without touching the network.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let forward = &config.forward;
    if forward.socket.trim().is_empty() {
        return Err(ConfigError::Validation(
            "forward.socket is required (--socket)".into(),
        ));
    }
    if forward.remote.trim().is_empty() {
        return Err(ConfigError::Validation(
            "forward.remote is required (--remote)".into(),
        ));
    }
    if !looks_like_host_port(&forward.remote) {
        return Err(ConfigError::Validation(format!(
            "forward.remote must be host:port, got {:?}",
            forward.remote
        )));
    }
    if forward.relay_buffer_size < min_relay_buffer_size() {
        return Err(ConfigError::Validation(format!(
            "forward.relay_buffer_size must be >= {}",
            min_relay_buffer_size()
        )));
    }
    if forward.relay_buffer_size > max_relay_buffer_size() {
        return Err(ConfigError::Validation(
            "forward.relay_buffer_size must be <= 1MB".into(),
        ));
    }
    if forward.connection_backlog == 0 {
        return Err(ConfigError::Validation(
            "forward.connection_backlog must be > 0".into(),
        ));
    }
    if forward.max_connections == Some(0) {
        return Err(ConfigError::Validation(
            "forward.max_connections must be > 0 (omit for unlimited)".into(),
        ));
    }
    Ok(())
}

fn looks_like_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
