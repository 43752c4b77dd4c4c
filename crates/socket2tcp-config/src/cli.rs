//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Local listening address: unix socket path (e.g. /tmp/socket2tcp.sock) or ip:port
    #[arg(short, long)]
    pub socket: Option<String>,
    /// Remote TCP address, e.g. 127.0.0.1:5432
    #[arg(short, long)]
    pub remote: Option<String>,
    /// Dial timeout for the remote in seconds (0 = no timeout)
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,
    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long)]
    pub max_connections: Option<usize>,
    /// Buffer size for the relay (bytes)
    #[arg(long)]
    pub relay_buffer_size: Option<usize>,
    /// Listen backlog size (TCP endpoints only)
    #[arg(long)]
    pub connection_backlog: Option<u32>,
    /// Seconds to wait for active connections on shutdown (0 = don't wait)
    #[arg(long)]
    pub drain_timeout_secs: Option<u64>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
    /// Override log format (pretty/compact/json)
    #[arg(long)]
    pub log_format: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.socket {
        config.forward.socket = v.clone();
    }
    if let Some(v) = &overrides.remote {
        config.forward.remote = v.clone();
    }
    if let Some(v) = overrides.connect_timeout_secs {
        config.forward.connect_timeout_secs = v;
    }
    if let Some(v) = overrides.max_connections {
        config.forward.max_connections = if v == 0 { None } else { Some(v) };
    }
    if let Some(v) = overrides.relay_buffer_size {
        config.forward.relay_buffer_size = v;
    }
    if let Some(v) = overrides.connection_backlog {
        config.forward.connection_backlog = v;
    }
    if let Some(v) = overrides.drain_timeout_secs {
        config.forward.drain_timeout_secs = v;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
    if let Some(v) = &overrides.log_format {
        config.logging.format = Some(v.clone());
    }
}
