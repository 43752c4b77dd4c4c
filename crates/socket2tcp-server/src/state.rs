//! Immutable per-server state shared by every connection task.

use std::time::Duration;

use crate::listener::LocalAddr;

pub(crate) struct ServerState {
    /// Remote target, `host:port`. Resolved on every dial.
    pub remote: String,
    /// Bound local endpoint, for the per-connection log line.
    pub local: LocalAddr,
    /// None = rely on the OS connect timeout.
    pub connect_timeout: Option<Duration>,
    pub relay_buffer_size: usize,
}
