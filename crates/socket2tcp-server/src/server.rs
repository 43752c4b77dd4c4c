//! Accept loop and connection dispatch.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};

use socket2tcp_config::{Config, validate_config};
use socket2tcp_core::defaults;

use crate::error::ServerError;
use crate::handler::handle_conn;
use crate::listener::{AcceptError, ListeningEndpoint, LocalAddr};
use crate::state::ServerState;
use crate::util::{ConnectionGuard, ConnectionTracker};

const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(defaults::DEFAULT_ACCEPT_RETRY_DELAY_MS);

/// A bound forwarding server, ready to accept.
pub struct Server {
    endpoint: ListeningEndpoint,
    state: Arc<ServerState>,
    conn_limit: Option<Arc<Semaphore>>,
    drain_timeout: Duration,
    tracker: ConnectionTracker,
}

impl Server {
    /// Bind the local endpoint described by `config`.
    ///
    /// The config is validated first; nothing is bound if it is invalid.
    /// Cancelling `shutdown` closes the endpoint and makes [`Server::run`]
    /// return. Must be called from within a tokio runtime.
    pub fn bind(config: &Config, shutdown: CancellationToken) -> Result<Self, ServerError> {
        validate_config(config).map_err(|e| ServerError::Config(e.to_string()))?;

        let forward = &config.forward;
        let local: LocalAddr = forward.socket.parse()?;
        let endpoint = ListeningEndpoint::bind(&local, forward.connection_backlog, shutdown)?;

        info!(
            local = %endpoint.local_addr(),
            remote = %forward.remote,
            "local socket forwarding to remote tcp"
        );

        let connect_timeout = match forward.connect_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        // Connection limiter (None = unlimited)
        let conn_limit = forward.max_connections.map(|n| {
            info!("max_connections set to {}", n);
            Arc::new(Semaphore::new(n))
        });

        let state = Arc::new(ServerState {
            remote: forward.remote.clone(),
            local: endpoint.local_addr().clone(),
            connect_timeout,
            relay_buffer_size: forward.relay_buffer_size,
        });

        Ok(Self {
            endpoint,
            state,
            conn_limit,
            drain_timeout: Duration::from_secs(forward.drain_timeout_secs),
            tracker: ConnectionTracker::new(),
        })
    }

    /// The bound local address (with the real port for `ip:0`).
    pub fn local_addr(&self) -> &LocalAddr {
        self.endpoint.local_addr()
    }

    /// Accept connections until the endpoint is closed.
    ///
    /// Each connection is handled on its own task; the loop never waits for
    /// one. Accept errors other than the endpoint being closed are logged
    /// and the loop continues.
    pub async fn run(self) -> Result<(), ServerError> {
        let Server {
            endpoint,
            state,
            conn_limit,
            drain_timeout,
            tracker,
        } = self;

        loop {
            let (inbound, peer) = match endpoint.accept().await {
                Ok(accepted) => accepted,
                Err(e) => match on_accept_error(&e) {
                    ControlFlow::Break(()) => break,
                    ControlFlow::Continue(()) => {
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                        continue;
                    }
                },
            };

            // Try to acquire connection permit
            let permit: Option<OwnedSemaphorePermit> = match &conn_limit {
                Some(sem) => match sem.clone().try_acquire_owned() {
                    Ok(p) => Some(p),
                    Err(_) => {
                        warn!(peer = %peer, reason = "max_connections", "connection rejected");
                        drop(inbound); // close immediately
                        continue;
                    }
                },
                None => None,
            };

            debug!(peer = %peer, "new connection");

            let state = state.clone();
            let guard = ConnectionGuard::new(tracker.clone());

            tokio::spawn(
                async move {
                    let _guard = guard; // ensure decrement on drop
                    let _permit = permit; // hold permit until connection closes
                    let start = Instant::now();

                    let result = handle_conn(inbound, state).await;

                    let duration_secs = start.elapsed().as_secs_f64();
                    match result {
                        Ok(()) => debug!(duration_secs, "connection closed"),
                        Err(err) => error!(
                            duration_secs,
                            kind = err.error_type(),
                            error = %err,
                            "connection failed"
                        ),
                    }
                }
                .instrument(info_span!("conn", peer = %peer)),
            );
        }

        // Release the socket (and unlink a unix socket file) before draining.
        drop(endpoint);

        let active = tracker.count();
        if active > 0 {
            if drain_timeout.is_zero() {
                info!("{} connections still active", active);
            } else {
                info!("waiting for {} active connections to drain", active);
                if tracker.wait_for_zero(drain_timeout).await {
                    info!("all connections drained");
                } else {
                    warn!(
                        "drain timeout, {} connections still active",
                        tracker.count()
                    );
                }
            }
        }

        info!("server stopped");
        Ok(())
    }
}

/// Log an accept failure and decide whether the accept loop goes on.
///
/// Only a closed endpoint stops the loop, and it is not an error.
fn on_accept_error(err: &AcceptError) -> ControlFlow<()> {
    match err {
        AcceptError::Closed => {
            info!("server shutdown");
            ControlFlow::Break(())
        }
        AcceptError::Io(e) => {
            error!(error = %e, "accept failed");
            ControlFlow::Continue(())
        }
    }
}

/// Bind and run the server until `shutdown` is cancelled.
pub async fn run_with_shutdown(config: Config, shutdown: CancellationToken) -> Result<(), ServerError> {
    Server::bind(&config, shutdown)?.run().await
}
