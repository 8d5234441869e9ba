// Scripted in-memory transport shared by the client integration tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use airctl_api::{Connection, ControlValues, Error, RawStatus, StatusStream, Transport};

type PushTx = mpsc::UnboundedSender<Result<RawStatus, Error>>;
type PushRx = mpsc::UnboundedReceiver<Result<RawStatus, Error>>;

// ── FakeTransport ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeTransport {
    state: Arc<FakeState>,
}

struct FakeState {
    connects: watch::Sender<usize>,
    failures_left: AtomicUsize,
    hang_connect: AtomicBool,
    hang_controls: AtomicBool,
    close_streams: AtomicBool,
    reply: AtomicBool,
    push_tx: Mutex<Option<PushTx>>,
    controls: Mutex<Vec<ControlValues>>,
    sent: watch::Sender<usize>,
    shutdowns: AtomicUsize,
}

impl FakeTransport {
    pub fn new() -> Self {
        let (connects, _) = watch::channel(0);
        let (sent, _) = watch::channel(0);
        Self {
            state: Arc::new(FakeState {
                connects,
                failures_left: AtomicUsize::new(0),
                hang_connect: AtomicBool::new(false),
                hang_controls: AtomicBool::new(false),
                close_streams: AtomicBool::new(false),
                reply: AtomicBool::new(true),
                push_tx: Mutex::new(None),
                controls: Mutex::new(Vec::new()),
                sent,
                shutdowns: AtomicUsize::new(0),
            }),
        }
    }

    /// Refuse the next `n` connect attempts.
    pub fn fail_next_connects(&self, n: usize) {
        self.state.failures_left.store(n, Ordering::SeqCst);
    }

    /// Never complete connect attempts.
    pub fn hang_connects(&self) {
        self.state.hang_connect.store(true, Ordering::SeqCst);
    }

    /// Never answer control requests.
    pub fn hang_controls(&self) {
        self.state.hang_controls.store(true, Ordering::SeqCst);
    }

    /// Accept connections but end their push streams right away.
    pub fn close_streams_on_connect(&self) {
        self.state.close_streams.store(true, Ordering::SeqCst);
    }

    /// Value returned by `set_control_values`.
    pub fn reply_with(&self, accepted: bool) {
        self.state.reply.store(accepted, Ordering::SeqCst);
    }

    pub fn connect_calls(&self) -> usize {
        *self.state.connects.borrow()
    }

    pub async fn wait_for_connects(&self, n: usize) {
        let mut rx = self.state.connects.subscribe();
        rx.wait_for(|calls| *calls >= n).await.unwrap();
    }

    /// Wait until `n` control requests reached the transport.
    pub async fn wait_for_controls(&self, n: usize) {
        let mut rx = self.state.sent.subscribe();
        rx.wait_for(|sent| *sent >= n).await.unwrap();
    }

    pub fn shutdowns(&self) -> usize {
        self.state.shutdowns.load(Ordering::SeqCst)
    }

    pub fn controls(&self) -> Vec<Value> {
        self.state
            .controls
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(Value::Object)
            .collect()
    }

    /// Push a raw payload on the newest connection.
    pub fn push(&self, payload: Value) {
        let Value::Object(raw) = payload else {
            panic!("push payload must be a JSON object");
        };
        if let Some(tx) = self.state.push_tx.lock().unwrap().as_ref() {
            let _ = tx.send(Ok(raw));
        }
    }

    /// End the push stream of the newest connection.
    pub fn end_stream(&self) {
        self.state.push_tx.lock().unwrap().take();
    }
}

impl Transport for FakeTransport {
    type Connection = FakeConnection;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        _timeout: Duration,
    ) -> Result<FakeConnection, Error> {
        self.state.connects.send_modify(|calls| *calls += 1);

        if self.state.hang_connect.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let refuse = self
            .state
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refuse {
            return Err(Error::Connect {
                host: host.to_owned(),
                port,
                reason: "connection refused".into(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if !self.state.close_streams.load(Ordering::SeqCst) {
            *self.state.push_tx.lock().unwrap() = Some(tx);
        }
        Ok(FakeConnection {
            state: Arc::clone(&self.state),
            push_rx: Mutex::new(Some(rx)),
        })
    }
}

// ── FakeConnection ──────────────────────────────────────────────────

pub struct FakeConnection {
    state: Arc<FakeState>,
    push_rx: Mutex<Option<PushRx>>,
}

impl Connection for FakeConnection {
    fn observe_status(&self) -> StatusStream {
        match self.push_rx.lock().unwrap().take() {
            Some(rx) => Box::pin(UnboundedReceiverStream::new(rx)),
            None => Box::pin(futures_util::stream::once(async { Err(Error::StreamTaken) })),
        }
    }

    async fn set_control_values(&self, values: ControlValues) -> Result<bool, Error> {
        self.state.controls.lock().unwrap().push(values);
        self.state.sent.send_modify(|sent| *sent += 1);
        if self.state.hang_controls.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok(self.state.reply.load(Ordering::SeqCst))
    }

    async fn shutdown(&self) {
        self.state.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Payloads ────────────────────────────────────────────────────────

pub fn status_payload(pwr: &str, mode: &str, om: &str) -> Value {
    json!({
        "DeviceId": "a1b2c3",
        "name": "Living Room",
        "modelid": "AC2729/10",
        "swversion": "1.0.7",
        "WifiVersion": "AWS_Philips_AIR@62.1",
        "pwr": pwr,
        "mode": mode,
        "om": om
    })
}
