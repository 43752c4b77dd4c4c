//! CLI module for socket2tcp.
//!
//! This module provides the command-line interface used by the socket2tcp
//! binary: config assembly, tracing setup and signal-driven shutdown.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use socket2tcp_config::{
    CliOverrides, Config, LoggingConfig, apply_overrides, load_config, validate_config,
};

use crate::shutdown::ShutdownCoordinator;
use crate::version::version_info;
use crate::run_with_shutdown;

/// socket2tcp CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "socket2tcp",
    about = "A simple tool for socket forwarding to remote tcp address",
    disable_version_flag = true
)]
pub struct ServerArgs {
    /// Config file path (json/yaml/toml). Flags override file values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print version information and exit
    #[arg(short = 'v', long)]
    pub version: bool,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Build the effective configuration from the config file and flags.
///
/// Fails before any network operation if the result is invalid.
pub fn resolve_config(args: &ServerArgs) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Run socket2tcp with the given arguments.
pub async fn run(args: ServerArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.version {
        print!("{}", version_info());
        return Ok(());
    }

    let config = resolve_config(&args)?;

    init_tracing(&config.logging);

    let coordinator = ShutdownCoordinator::new();
    coordinator.spawn_signal_watcher();

    run_with_shutdown(config, coordinator.token()).await?;
    Ok(())
}

/// Initialize tracing subscriber with the given logging configuration.
///
/// Supports:
/// - `level`: Base log level (trace, debug, info, warn, error)
/// - `format`: Output format (json, pretty, compact). Default: pretty
/// - `output`: Output target (stdout, stderr). Default: stderr
/// - `filters`: Per-module log level overrides
fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(filter_directives(config)).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.output.as_deref() {
        Some("stdout") => BoxMakeWriter::new(io::stdout),
        _ => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.format.as_deref() {
        Some("json") => registry.with(fmt::layer().json().with_writer(writer)).init(),
        Some("compact") => registry.with(fmt::layer().compact().with_writer(writer)).init(),
        _ => registry.with(fmt::layer().with_writer(writer)).init(),
    }
}

/// Base level followed by `module=level` overrides, in `EnvFilter` syntax.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_deref().unwrap_or("info").to_string();
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort();
    for (module, level) in filters {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_remote_fails_before_network() {
        let args = ServerArgs::parse_from(["socket2tcp", "-s", "/tmp/x.sock"]);
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("forward.remote"));
    }

    #[test]
    fn missing_socket_fails_before_network() {
        let args = ServerArgs::parse_from(["socket2tcp", "--remote", "127.0.0.1:80"]);
        let err = resolve_config(&args).unwrap_err();
        assert!(err.to_string().contains("forward.socket"));
    }

    #[test]
    fn flags_are_enough() {
        let args = ServerArgs::parse_from([
            "socket2tcp",
            "-s",
            "/tmp/x.sock",
            "-r",
            "127.0.0.1:80",
            "--connect-timeout-secs",
            "3",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.forward.socket, "/tmp/x.sock");
        assert_eq!(config.forward.remote, "127.0.0.1:80");
        assert_eq!(config.forward.connect_timeout_secs, 3);
    }

    #[test]
    fn filter_directives_append_module_overrides() {
        let mut logging = LoggingConfig::default();
        assert_eq!(filter_directives(&logging), "info");

        logging.level = Some("debug".into());
        logging
            .filters
            .insert("socket2tcp_server".into(), "trace".into());
        logging.filters.insert("tokio".into(), "warn".into());
        assert_eq!(
            filter_directives(&logging),
            "debug,socket2tcp_server=trace,tokio=warn"
        );
    }

    #[test]
    fn version_flag_parses() {
        let args = ServerArgs::parse_from(["socket2tcp", "-v"]);
        assert!(args.version);
    }
}
