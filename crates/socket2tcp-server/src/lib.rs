//! socket2tcp server library.
//!
//! Listens on a local endpoint (unix socket or TCP), dials a fixed remote
//! TCP address for every accepted connection and relays bytes both ways.
//! Exposed for the binary, integration tests and embedding.

pub mod cli;
mod error;
mod handler;
mod listener;
mod server;
mod shutdown;
mod state;
mod util;
mod version;

pub use cli::ServerArgs;
pub use error::ServerError;
pub use listener::{AcceptError, InboundStream, ListeningEndpoint, LocalAddr};
pub use server::{Server, run_with_shutdown};
pub use shutdown::{ShutdownCoordinator, shutdown_signal};
pub use tokio_util::sync::CancellationToken;
pub use version::{BUILD_DATE, COMMIT_ID, version_info};
