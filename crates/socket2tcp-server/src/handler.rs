//! Per-connection handling: dial the remote, relay, release.
//!
//! Both streams are owned by this task and dropped on every exit path,
//! including early returns and unwinding, which closes them.

use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, info};

use socket2tcp_core::io::relay_bidirectional;

use crate::error::ServerError;
use crate::listener::InboundStream;
use crate::state::ServerState;

/// Forward one accepted connection to the remote target.
///
/// A single dial attempt is made. On dial failure the inbound stream is
/// dropped and the error returned. Relay errors that are only artifacts of
/// the relay's own teardown never reach this level.
pub(crate) async fn handle_conn(
    inbound: InboundStream,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    let outbound = dial(&state).await?;

    let remote = outbound
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| state.remote.clone());
    info!(local = %state.local, remote = %remote, "handle conn");

    let result = relay_bidirectional(inbound, outbound, state.relay_buffer_size).await;
    debug!(
        inbound_to_outbound = result.inbound_to_outbound,
        outbound_to_inbound = result.outbound_to_inbound,
        "relay finished"
    );

    match result.error {
        Some(e) => Err(ServerError::Relay(e)),
        None => Ok(()),
    }
}

async fn dial(state: &ServerState) -> Result<TcpStream, ServerError> {
    let connect = TcpStream::connect(state.remote.as_str());
    let stream = match state.connect_timeout {
        Some(timeout) => tokio::time::timeout(timeout, connect).await.map_err(|_| {
            ServerError::DialTimeout {
                remote: state.remote.clone(),
                timeout,
            }
        })?,
        None => connect.await,
    }
    .map_err(|source| ServerError::Dial {
        remote: state.remote.clone(),
        source,
    })?;

    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "failed to set TCP_NODELAY");
    }
    Ok(stream)
}
