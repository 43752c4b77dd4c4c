//! socket2tcp binary.
//!
//! Forwards a local unix socket (or TCP endpoint) to a remote TCP address
//! until SIGINT/SIGTERM.

use std::process::ExitCode;

use clap::Parser;
use socket2tcp_server::{ServerArgs, cli};

#[tokio::main]
async fn main() -> ExitCode {
    let args = ServerArgs::parse();

    match cli::run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
