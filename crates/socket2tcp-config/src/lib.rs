//! Configuration loading, validation and CLI overrides for socket2tcp.
//!
//! A [`Config`] is assembled once at startup: optionally loaded from a file
//! (json/yaml/toml), then patched with [`CliOverrides`], then checked by
//! [`validate_config`]. The result is passed by value into the server and
//! never mutated afterwards.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;
