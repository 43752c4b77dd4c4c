//! I/O utilities for bidirectional relay.
//!
//! This module provides the relay engine used by the forwarding server.

mod relay;

pub use relay::{RelayResult, relay_bidirectional};
