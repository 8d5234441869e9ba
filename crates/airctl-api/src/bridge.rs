//! Newline-delimited JSON transport over TCP.
//!
//! Talks to a CoAP-to-TCP bridge that relays the purifier's observe
//! stream and control endpoint as one JSON object per line:
//!
//! - bridge → client: `{"type":"status","data":{...}}` for every push,
//!   `{"type":"ack","id":7,"ok":true}` in reply to a control request
//! - client → bridge: `{"type":"control","id":7,"values":{"pwr":"1"}}`
//!
//! A background reader task demultiplexes the two inbound message kinds:
//! status pushes go to the stream returned by
//! [`observe_status`](Connection::observe_status), acks complete the
//! matching pending control request.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use airctl_api::{Connection, LineTransport, Transport};
//! use futures_util::StreamExt;
//!
//! let conn = LineTransport.connect("192.168.1.40", 5683, Duration::from_secs(10)).await?;
//! let mut pushes = conn.observe_status();
//!
//! let mut values = serde_json::Map::new();
//! values.insert("pwr".into(), "1".into());
//! let accepted = conn.set_control_values(values).await?;
//!
//! while let Some(Ok(raw)) = pushes.next().await {
//!     println!("{raw:?}");
//! }
//!
//! conn.shutdown().await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::Error;
use crate::transport::{Connection, ControlValues, RawStatus, StatusStream, Transport};

// ── Limits ───────────────────────────────────────────────────────────

const STATUS_CHANNEL_CAPACITY: usize = 64;
const MAX_LINE_LENGTH: usize = 64 * 1024;

type PendingAcks = Arc<Mutex<HashMap<u64, oneshot::Sender<bool>>>>;

// ── Wire messages ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Inbound {
    Status { data: RawStatus },
    Ack { id: u64, ok: bool },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Outbound<'a> {
    Control { id: u64, values: &'a ControlValues },
}

// ── LineTransport ────────────────────────────────────────────────────

/// [`Transport`] speaking newline-delimited JSON over TCP.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineTransport;

impl Transport for LineTransport {
    type Connection = LineConnection;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<LineConnection, Error> {
        LineConnection::open(host, port, timeout).await
    }
}

// ── LineConnection ───────────────────────────────────────────────────

/// One TCP connection to the bridge.
///
/// Dropping the connection stops the reader task; call
/// [`shutdown`](Connection::shutdown) to also close the socket and wait
/// for the reader to finish.
pub struct LineConnection {
    writer: Mutex<OwnedWriteHalf>,
    pending: PendingAcks,
    status_rx: std::sync::Mutex<Option<mpsc::Receiver<Result<RawStatus, Error>>>>,
    next_id: AtomicU64,
    /// Cancelled on local shutdown and when the reader sees the socket close.
    closed: CancellationToken,
    reader: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl LineConnection {
    async fn open(host: &str, port: u16, timeout: Duration) -> Result<Self, Error> {
        debug!(host, port, "connecting to bridge");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(Error::Connect {
                    host: host.to_owned(),
                    port,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(Error::Timeout {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };
        stream.set_nodelay(true)?;

        let (read, write) = stream.into_split();
        let (status_tx, status_rx) = mpsc::channel(STATUS_CHANNEL_CAPACITY);
        let pending: PendingAcks = Arc::default();
        let closed = CancellationToken::new();

        let reader = tokio::spawn(read_loop(
            read,
            status_tx,
            Arc::clone(&pending),
            closed.clone(),
        ));

        info!(host, port, "bridge connection established");

        Ok(Self {
            writer: Mutex::new(write),
            pending,
            status_rx: std::sync::Mutex::new(Some(status_rx)),
            next_id: AtomicU64::new(1),
            closed,
            reader: std::sync::Mutex::new(Some(reader)),
        })
    }

    async fn send_control(&self, values: ControlValues) -> Result<bool, Error> {
        if self.closed.is_cancelled() {
            return Err(Error::Closed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = serde_json::to_string(&Outbound::Control {
            id,
            values: &values,
        })
        .map_err(|e| Error::Protocol {
            message: format!("cannot encode control request: {e}"),
        })?;
        line.push('\n');

        let (ack_tx, ack_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, ack_tx);

        let written = self.writer.lock().await.write_all(line.as_bytes()).await;
        if let Err(e) = written {
            self.pending.lock().await.remove(&id);
            return Err(e.into());
        }
        trace!(id, "control request sent");

        tokio::select! {
            ack = ack_rx => ack.map_err(|_| Error::Closed),
            () = self.closed.cancelled() => Err(Error::Closed),
        }
    }
}

impl Connection for LineConnection {
    fn observe_status(&self) -> StatusStream {
        let taken = self
            .status_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match taken {
            Some(rx) => Box::pin(ReceiverStream::new(rx)),
            None => Box::pin(futures_util::stream::once(async { Err(Error::StreamTaken) })),
        }
    }

    async fn set_control_values(&self, values: ControlValues) -> Result<bool, Error> {
        self.send_control(values).await
    }

    async fn shutdown(&self) {
        self.closed.cancel();

        if let Err(e) = self.writer.lock().await.shutdown().await {
            debug!(error = %e, "bridge socket shutdown failed");
        }

        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = reader {
            if let Err(e) = handle.await {
                warn!(error = %e, "bridge reader task ended abnormally");
            }
        }
    }
}

impl Drop for LineConnection {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

// ── Background reader ────────────────────────────────────────────────

/// Read lines until the socket closes or the connection is shut down.
async fn read_loop(
    read: OwnedReadHalf,
    status_tx: mpsc::Sender<Result<RawStatus, Error>>,
    pending: PendingAcks,
    closed: CancellationToken,
) {
    let mut lines = FramedRead::new(read, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));

    loop {
        tokio::select! {
            biased;
            () = closed.cancelled() => break,
            frame = lines.next() => {
                match frame {
                    Some(Ok(line)) => dispatch_line(&line, &status_tx, &pending).await,
                    Some(Err(e)) => {
                        warn!(error = %e, "bridge read failed");
                        // Dropping the sender ends the stream if this does not fit.
                        let _ = status_tx
                            .try_send(Err(Error::Protocol { message: e.to_string() }));
                        break;
                    }
                    None => {
                        info!("bridge closed the connection");
                        break;
                    }
                }
            }
        }
    }

    closed.cancel();
    // Dropping the senders fails every outstanding control request.
    pending.lock().await.clear();
}

/// Route one inbound line to the status stream or a pending ack.
async fn dispatch_line(
    line: &str,
    status_tx: &mpsc::Sender<Result<RawStatus, Error>>,
    pending: &PendingAcks,
) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }

    match serde_json::from_str::<Inbound>(trimmed) {
        Ok(Inbound::Status { data }) => match status_tx.try_send(Ok(data)) {
            // Never park the reader: acks queue up behind it.
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => warn!("status backlog full, dropping push"),
        },
        Ok(Inbound::Ack { id, ok }) => {
            let waiter = pending.lock().await.remove(&id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(ok);
                }
                None => debug!(id, "ack for unknown control request"),
            }
        }
        Err(e) => {
            debug!(error = %e, "skipping unparseable bridge line");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn control_request_encoding() {
        let mut values = ControlValues::new();
        values.insert("pwr".into(), "1".into());

        let line = serde_json::to_string(&Outbound::Control {
            id: 3,
            values: &values,
        })
        .unwrap();
        assert_eq!(line, r#"{"type":"control","id":3,"values":{"pwr":"1"}}"#);
    }

    #[test]
    fn inbound_status_and_ack_parse() {
        let status: Inbound =
            serde_json::from_str(r#"{"type":"status","data":{"pwr":"1"}}"#).unwrap();
        assert!(matches!(status, Inbound::Status { ref data } if data["pwr"] == "1"));

        let ack: Inbound = serde_json::from_str(r#"{"type":"ack","id":9,"ok":false}"#).unwrap();
        assert!(matches!(ack, Inbound::Ack { id: 9, ok: false }));
    }

    #[tokio::test]
    async fn dispatch_routes_acks_to_waiters() {
        let (status_tx, mut status_rx) = mpsc::channel(4);
        let pending: PendingAcks = Arc::default();
        let (ack_tx, ack_rx) = oneshot::channel();
        pending.lock().await.insert(5, ack_tx);

        dispatch_line(r#"{"type":"ack","id":5,"ok":true}"#, &status_tx, &pending).await;

        assert!(ack_rx.await.unwrap());
        assert!(pending.lock().await.is_empty());
        assert!(status_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn full_status_backlog_does_not_hold_back_acks() {
        let (status_tx, mut status_rx) = mpsc::channel(1);
        let pending: PendingAcks = Arc::default();
        let (ack_tx, ack_rx) = oneshot::channel();
        pending.lock().await.insert(8, ack_tx);

        dispatch_line(r#"{"type":"status","data":{"om":"1"}}"#, &status_tx, &pending).await;
        dispatch_line(r#"{"type":"status","data":{"om":"2"}}"#, &status_tx, &pending).await;
        dispatch_line(r#"{"type":"ack","id":8,"ok":true}"#, &status_tx, &pending).await;

        assert!(ack_rx.await.unwrap());
        let kept = status_rx.try_recv().unwrap().unwrap();
        assert_eq!(kept["om"], "1");
        assert!(status_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dispatch_skips_garbage() {
        let (status_tx, mut status_rx) = mpsc::channel(4);
        let pending: PendingAcks = Arc::default();

        dispatch_line("not json at all", &status_tx, &pending).await;
        dispatch_line("   ", &status_tx, &pending).await;
        dispatch_line(r#"{"type":"status","data":{"om":"2"}}"#, &status_tx, &pending).await;

        let pushed = status_rx.try_recv().unwrap().unwrap();
        assert_eq!(pushed["om"], "2");
        assert!(status_rx.try_recv().is_err());
    }
}
