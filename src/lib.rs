//! # socket2tcp
//!
//! Forwards connections accepted on a local endpoint (a unix socket by
//! default) to a fixed remote TCP address.
//!
//! ## Crates
//!
//! - [`socket2tcp_core`] - Defaults, error categories and the relay engine
//! - [`socket2tcp_config`] - Configuration loading, overrides and validation
//! - [`socket2tcp_server`] - Accept loop, connection handling and shutdown

pub use socket2tcp_config as config;
pub use socket2tcp_core as core;
pub use socket2tcp_server as server;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use socket2tcp_config::{Config, load_config, validate_config};
    pub use socket2tcp_core::io::{RelayResult, relay_bidirectional};
    pub use socket2tcp_server::{
        CancellationToken, Server, ServerError, ShutdownCoordinator, run_with_shutdown,
    };
}
