//! Default value functions for serde deserialization.
//!
//! These functions forward to constants defined in `socket2tcp_core::defaults`.

use socket2tcp_core::defaults;

/// Generate default value functions that forward to socket2tcp_core::defaults constants.
macro_rules! default_fns {
    ($($fn_name:ident => $const_name:ident : $ty:ty),* $(,)?) => {
        $(
            pub(crate) fn $fn_name() -> $ty {
                defaults::$const_name
            }
        )*
    };
}

default_fns! {
    default_connect_timeout_secs => DEFAULT_CONNECT_TIMEOUT_SECS: u64,
    default_drain_timeout_secs   => DEFAULT_DRAIN_TIMEOUT_SECS: u64,
    default_relay_buffer_size    => DEFAULT_RELAY_BUFFER_SIZE: usize,
    default_connection_backlog   => DEFAULT_CONNECTION_BACKLOG: u32,
    min_relay_buffer_size        => MIN_RELAY_BUFFER_SIZE: usize,
    max_relay_buffer_size        => MAX_RELAY_BUFFER_SIZE: usize,
}
