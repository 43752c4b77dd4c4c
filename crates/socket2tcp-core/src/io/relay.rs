//! Bidirectional data relay with symmetric unblocking.
//!
//! Both directions are driven concurrently inside one future. They share an
//! abort token: as soon as either direction terminates (EOF, error, or its
//! own abort), the token fires and every pending read or write in the other
//! direction returns immediately. A half-closed peer therefore can never
//! pin the relay open.
//!
//! Terminations caused only by the abort token are artifacts of this
//! mechanism and are never reported as errors.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::defaults::DEFAULT_RELAY_BUFFER_SIZE;

/// Outcome of one relay invocation.
///
/// Byte counts are the bytes actually written to each destination before
/// the relay terminated, including partial writes cut short by the abort.
#[derive(Debug)]
pub struct RelayResult {
    /// Bytes copied from the inbound stream to the outbound stream.
    pub inbound_to_outbound: u64,
    /// Bytes copied from the outbound stream to the inbound stream.
    pub outbound_to_inbound: u64,
    /// First genuine error, outbound->inbound direction taking priority.
    pub error: Option<io::Error>,
}

/// How a single copy direction ended.
#[derive(Debug)]
enum Termination {
    /// Source reached end-of-stream.
    Eof,
    /// Force-unblocked because the peer direction already terminated.
    Aborted,
    /// Genuine transport failure.
    Failed(io::Error),
}

impl Termination {
    fn into_error(self) -> Option<io::Error> {
        match self {
            Termination::Failed(e) => Some(e),
            Termination::Eof | Termination::Aborted => None,
        }
    }
}

struct DirectionResult {
    bytes: u64,
    end: Termination,
}

/// One-directional copy that observes `abort` at every suspension point.
///
/// On EOF the destination's write side is shut down so the peer sees the
/// half-close before the abort tears everything down.
async fn copy_until_aborted<R, W>(
    reader: &mut R,
    writer: &mut W,
    buf: &mut [u8],
    abort: &CancellationToken,
) -> DirectionResult
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut bytes: u64 = 0;

    loop {
        let n = tokio::select! {
            biased;
            _ = abort.cancelled() => {
                return DirectionResult { bytes, end: Termination::Aborted };
            }
            read = reader.read(buf) => match read {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => return DirectionResult { bytes, end: Termination::Failed(e) },
            },
        };

        let mut pos = 0;
        while pos < n {
            tokio::select! {
                biased;
                _ = abort.cancelled() => {
                    return DirectionResult { bytes, end: Termination::Aborted };
                }
                written = writer.write(&buf[pos..n]) => match written {
                    Ok(0) => {
                        let e = io::Error::from(io::ErrorKind::WriteZero);
                        return DirectionResult { bytes, end: Termination::Failed(e) };
                    }
                    Ok(w) => {
                        pos += w;
                        bytes += w as u64;
                    }
                    Err(e) => return DirectionResult { bytes, end: Termination::Failed(e) },
                },
            }
        }

        tokio::select! {
            biased;
            _ = abort.cancelled() => {
                return DirectionResult { bytes, end: Termination::Aborted };
            }
            flushed = writer.flush() => {
                if let Err(e) = flushed {
                    return DirectionResult { bytes, end: Termination::Failed(e) };
                }
            }
        }
    }

    // Shutdown failures after EOF are not worth surfacing: the relay is
    // about to tear both streams down anyway.
    tokio::select! {
        biased;
        _ = abort.cancelled() => {}
        _ = writer.shutdown() => {}
    }
    DirectionResult {
        bytes,
        end: Termination::Eof,
    }
}

/// Relay bytes between `inbound` and `outbound` until either side finishes.
///
/// Returns after both directions have terminated. Termination of one
/// direction, for any reason, aborts the other one promptly.
///
/// # Arguments
///
/// * `inbound` - The accepted local stream
/// * `outbound` - The dialed remote stream
/// * `buffer_size` - Size of the read buffer for each direction; zero
///   selects the default size
pub async fn relay_bidirectional<A, B>(inbound: A, outbound: B, buffer_size: usize) -> RelayResult
where
    A: AsyncRead + AsyncWrite,
    B: AsyncRead + AsyncWrite,
{
    // A zero-length read buffer would read as EOF on the first call.
    let buffer_size = if buffer_size == 0 {
        DEFAULT_RELAY_BUFFER_SIZE
    } else {
        buffer_size
    };

    let (mut in_r, mut in_w) = tokio::io::split(inbound);
    let (mut out_r, mut out_w) = tokio::io::split(outbound);

    let mut buf_a = vec![0u8; buffer_size];
    let mut buf_b = vec![0u8; buffer_size];
    let abort = CancellationToken::new();

    let outbound_to_inbound = async {
        let res = copy_until_aborted(&mut out_r, &mut in_w, &mut buf_a, &abort).await;
        abort.cancel();
        res
    };
    let inbound_to_outbound = async {
        let res = copy_until_aborted(&mut in_r, &mut out_w, &mut buf_b, &abort).await;
        abort.cancel();
        res
    };

    let (a, b) = tokio::join!(outbound_to_inbound, inbound_to_outbound);

    let error = a.end.into_error().or_else(|| b.end.into_error());

    RelayResult {
        inbound_to_outbound: b.bytes,
        outbound_to_inbound: a.bytes,
        error,
    }
}
