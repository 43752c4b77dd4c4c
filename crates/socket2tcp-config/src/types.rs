//! Configuration type definitions for forwarding and logging.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to listen, where to forward, and how hard to try.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardConfig {
    /// Local listening address: a unix socket path, or `ip:port` for TCP.
    #[serde(default)]
    pub socket: String,
    /// Remote TCP address (`host:port`) every connection is forwarded to.
    #[serde(default)]
    pub remote: String,
    /// Dial timeout for the remote in seconds (0 = no timeout).
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum concurrent connections (None = unlimited)
    #[serde(default)]
    pub max_connections: Option<usize>,
    /// Relay buffer size per direction (bytes).
    #[serde(default = "default_relay_buffer_size")]
    pub relay_buffer_size: usize,
    /// Listen backlog for TCP endpoints.
    #[serde(default = "default_connection_backlog")]
    pub connection_backlog: u32,
    /// How long to wait for active connections once the accept loop stops
    /// (0 = return immediately).
    #[serde(default = "default_drain_timeout_secs")]
    pub drain_timeout_secs: u64,
}

impl Default for ForwardConfig {
    fn default() -> Self {
        Self {
            socket: String::new(),
            remote: String::new(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_connections: None,
            relay_buffer_size: default_relay_buffer_size(),
            connection_backlog: default_connection_backlog(),
            drain_timeout_secs: default_drain_timeout_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error. Default: info
    pub level: Option<String>,
    /// Output format: json, pretty, compact. Default: pretty
    #[serde(default)]
    pub format: Option<String>,
    /// Output target: stdout, stderr. Default: stderr
    #[serde(default)]
    pub output: Option<String>,
    /// Per-module log level filters, e.g. {"socket2tcp_server": "debug"}
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
