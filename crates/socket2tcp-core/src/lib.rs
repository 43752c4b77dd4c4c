//! Core types and constants shared across socket2tcp crates.
//!
//! This crate provides:
//! - Default configuration values
//! - Error type constants for logging
//! - The bidirectional relay engine
//! - Common project metadata

pub mod defaults;
pub mod errors;
pub mod io;

// Re-export commonly used items at crate root
pub use defaults::*;
pub use errors::*;

/// Project name.
pub const PROJECT_NAME: &str = "socket2tcp";
/// Project version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
