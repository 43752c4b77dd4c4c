//! Integration tests for socket2tcp-server.
//!
//! These tests run the real accept loop against mock remote servers and
//! verify:
//! - End-to-end forwarding over TCP and unix endpoints
//! - Dial failures closing only the affected connection
//! - Clean shutdown of the accept loop
//! - Connection limits and the shutdown drain
#![allow(clippy::tests_outside_test_module)]

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpListener},
    thread,
    time::Duration,
};

use socket2tcp_config::Config;
use socket2tcp_server::{CancellationToken, LocalAddr, Server, ServerError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(5);

// ============================================================================
// Test Helper: Mock Remote Servers
// ============================================================================

/// A simple TCP server that echoes back whatever it receives.
struct MockEchoServer {
    addr: SocketAddr,
    _handle: thread::JoinHandle<()>,
}

impl MockEchoServer {
    fn start() -> Self {
        Self::start_on(TcpListener::bind("127.0.0.1:0").unwrap())
    }

    fn start_on(listener: TcpListener) -> Self {
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                thread::spawn(move || {
                    let mut buf = [0u8; 4096];
                    loop {
                        match stream.read(&mut buf) {
                            Ok(0) => break,
                            Ok(n) => {
                                if stream.write_all(&buf[..n]).is_err() {
                                    break;
                                }
                            }
                            Err(_) => break,
                        }
                    }
                });
            }
        });

        Self {
            addr,
            _handle: handle,
        }
    }
}

/// A TCP server that answers "PING" with "PONG".
///
/// With `close_after_reply` it closes the connection right after replying,
/// otherwise it waits for the client to close first.
struct MockPongServer {
    addr: SocketAddr,
    _handle: thread::JoinHandle<()>,
}

impl MockPongServer {
    fn start(close_after_reply: bool) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            for mut stream in listener.incoming().flatten() {
                thread::spawn(move || {
                    let mut req = [0u8; 4];
                    if stream.read_exact(&mut req).is_err() || &req != b"PING" {
                        return;
                    }
                    if stream.write_all(b"PONG").is_err() {
                        return;
                    }
                    if close_after_reply {
                        return;
                    }
                    // Wait for the client side to close.
                    let mut rest = Vec::new();
                    let _ = stream.read_to_end(&mut rest);
                });
            }
        });

        Self {
            addr,
            _handle: handle,
        }
    }
}

/// An address with nothing listening on it.
fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

// ============================================================================
// Test Helper: Forwarding Server
// ============================================================================

fn test_config(socket: &str, remote: SocketAddr) -> Config {
    let mut config = Config::default();
    config.forward.socket = socket.to_string();
    config.forward.remote = remote.to_string();
    config.forward.connect_timeout_secs = 5;
    config
}

struct RunningServer {
    local: LocalAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), ServerError>>,
}

impl RunningServer {
    fn start(config: Config) -> Self {
        let shutdown = CancellationToken::new();
        let server = Server::bind(&config, shutdown.clone()).unwrap();
        let local = server.local_addr().clone();
        let handle = tokio::spawn(server.run());
        Self {
            local,
            shutdown,
            handle,
        }
    }

    fn tcp_addr(&self) -> SocketAddr {
        match &self.local {
            LocalAddr::Tcp(addr) => *addr,
            #[allow(unreachable_patterns)]
            other => panic!("expected tcp endpoint, got {other}"),
        }
    }

    async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.tcp_addr()).await.unwrap()
    }

    async fn stop(self) {
        self.shutdown.cancel();
        tokio::time::timeout(WAIT, self.handle)
            .await
            .expect("server did not stop")
            .unwrap()
            .unwrap();
    }
}

async fn assert_closed(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let res = tokio::time::timeout(WAIT, stream.read(&mut buf))
        .await
        .expect("connection was not closed");
    // A reset is as good as EOF here.
    if let Ok(n) = res {
        assert_eq!(n, 0, "expected EOF, got {n} bytes");
    }
}

async fn echo_roundtrip(stream: &mut TcpStream, payload: &[u8]) {
    stream.write_all(payload).await.unwrap();
    let mut buf = vec![0u8; payload.len()];
    tokio::time::timeout(WAIT, stream.read_exact(&mut buf))
        .await
        .expect("echo timed out")
        .unwrap();
    assert_eq!(buf, payload);
}

// ============================================================================
// End-to-end forwarding
// ============================================================================

#[tokio::test]
async fn test_ping_pong_client_closes() {
    let remote = MockPongServer::start(false);
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));

    let mut client = server.connect().await;
    client.write_all(b"PING").await.unwrap();

    let mut reply = [0u8; 4];
    tokio::time::timeout(WAIT, client.read_exact(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&reply, b"PONG");

    client.shutdown().await.unwrap();
    assert_closed(&mut client).await;

    server.stop().await;
}

#[tokio::test]
async fn test_ping_pong_remote_closes() {
    let remote = MockPongServer::start(true);
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));

    let mut client = server.connect().await;
    client.write_all(b"PING").await.unwrap();

    let mut received = Vec::new();
    tokio::time::timeout(WAIT, client.read_to_end(&mut received))
        .await
        .expect("remote close was not propagated")
        .unwrap();
    assert_eq!(received, b"PONG");

    server.stop().await;
}

#[cfg(unix)]
#[tokio::test]
async fn test_ping_pong_over_unix_socket() {
    use tokio::net::UnixStream;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("socket2tcp.sock");

    let remote = MockPongServer::start(false);
    let server = RunningServer::start(test_config(path.to_str().unwrap(), remote.addr));
    assert_eq!(server.local, LocalAddr::Unix(path.clone()));

    let mut client = UnixStream::connect(&path).await.unwrap();
    client.write_all(b"PING").await.unwrap();

    let mut reply = [0u8; 4];
    tokio::time::timeout(WAIT, client.read_exact(&mut reply))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&reply, b"PONG");
    drop(client);

    server.stop().await;

    // Closing the endpoint unlinks the socket file.
    assert!(!path.exists());
}

#[tokio::test]
async fn test_concurrent_connections_are_independent() {
    let remote = MockEchoServer::start();
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));

    let mut first = server.connect().await;
    let mut second = server.connect().await;

    echo_roundtrip(&mut first, b"first-1").await;
    echo_roundtrip(&mut second, b"second-1").await;

    drop(first);

    echo_roundtrip(&mut second, b"second-2").await;

    server.stop().await;
}

#[tokio::test]
async fn test_large_payload_roundtrip() {
    let remote = MockEchoServer::start();
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));

    let client = server.connect().await;
    let (mut reader, mut writer) = client.into_split();

    let payload: Vec<u8> = (0..512 * 1024).map(|i| (i % 253) as u8).collect();
    let expected = payload.clone();

    let write = tokio::spawn(async move {
        writer.write_all(&payload).await.unwrap();
        writer
    });
    let mut received = vec![0u8; expected.len()];
    tokio::time::timeout(WAIT, reader.read_exact(&mut received))
        .await
        .expect("payload did not come back")
        .unwrap();
    assert_eq!(received, expected);
    drop(write.await.unwrap());

    server.stop().await;
}

// ============================================================================
// Dial failures
// ============================================================================

#[tokio::test]
async fn test_dial_failure_closes_inbound() {
    let server = RunningServer::start(test_config("127.0.0.1:0", refused_addr()));

    // Every accepted connection is closed; none blocks the next one.
    for _ in 0..3 {
        let mut client = server.connect().await;
        assert_closed(&mut client).await;
    }

    server.stop().await;
}

#[tokio::test]
async fn test_dial_failure_does_not_block_later_connections() {
    let remote_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let remote_addr = remote_listener.local_addr().unwrap();
    drop(remote_listener);

    let server = RunningServer::start(test_config("127.0.0.1:0", remote_addr));

    let mut failed = server.connect().await;
    assert_closed(&mut failed).await;

    // Bring the remote up on the same port.
    let _remote = MockEchoServer::start_on(TcpListener::bind(remote_addr).unwrap());

    let mut client = server.connect().await;
    echo_roundtrip(&mut client, b"after-failure").await;

    server.stop().await;
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn test_shutdown_stops_accept_loop() {
    let remote = MockEchoServer::start();
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));
    let addr = server.tcp_addr();

    server.stop().await;

    // The listener is gone once run() has returned.
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_leaves_active_connections_running() {
    let remote = MockEchoServer::start();
    let server = RunningServer::start(test_config("127.0.0.1:0", remote.addr));

    let mut client = server.connect().await;
    echo_roundtrip(&mut client, b"before").await;

    server.stop().await;

    echo_roundtrip(&mut client, b"after").await;
}

#[tokio::test]
async fn test_drain_waits_for_active_connections() {
    let remote = MockEchoServer::start();
    let mut config = test_config("127.0.0.1:0", remote.addr);
    config.forward.drain_timeout_secs = 30;
    let server = RunningServer::start(config);

    let mut client = server.connect().await;
    echo_roundtrip(&mut client, b"hold").await;

    server.shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.handle.is_finished(), "run() returned before drain");

    drop(client);

    tokio::time::timeout(WAIT, server.handle)
        .await
        .expect("drain did not finish after the client closed")
        .unwrap()
        .unwrap();
}

// ============================================================================
// Connection limit
// ============================================================================

#[tokio::test]
async fn test_max_connections_rejects_excess() {
    let remote = MockEchoServer::start();
    let mut config = test_config("127.0.0.1:0", remote.addr);
    config.forward.max_connections = Some(1);
    let server = RunningServer::start(config);

    let mut first = server.connect().await;
    echo_roundtrip(&mut first, b"holding the only slot").await;

    let mut second = server.connect().await;
    assert_closed(&mut second).await;

    // The slot frees up once the first connection is gone.
    drop(first);
    let mut third = None;
    for _ in 0..50 {
        let mut candidate = server.connect().await;
        candidate.write_all(b"x").await.unwrap();
        let mut buf = [0u8; 1];
        if let Ok(Ok(1)) =
            tokio::time::timeout(Duration::from_millis(200), candidate.read(&mut buf)).await
        {
            third = Some(candidate);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(third.is_some(), "slot was never released");

    server.stop().await;
}
