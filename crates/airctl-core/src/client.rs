// ── Client abstraction ──
//
// Resilient connection supervisor for one purifier. Owns the reconnect
// loop, the command queue, and the subscriber registry. Each successful
// connect starts a generation of three sibling workers; the first one to
// return ends the generation and triggers a reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::{Mutex, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use airctl_api::{Connection, Transport};

use crate::command::{Command, CommandQueue, PendingCommand};
use crate::config::ClientConfig;
use crate::error::{CommandError, CoreError};
use crate::model::{FanSpeed, ListenerId, Mode, Status};
use crate::store::StatusStore;
use crate::subscribers::SubscriberRegistry;
use crate::workers::{self, Worker, observer, processor, watchdog};

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ShuttingDown,
}

// ── Client ───────────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ClientInner>`. Nothing happens until
/// [`start()`](Self::start); call [`stop()`](Self::stop) before dropping
/// the last clone, otherwise the supervising task keeps running.
pub struct Client<T: Transport> {
    inner: Arc<ClientInner<T>>,
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ClientInner<T: Transport> {
    config: ClientConfig,
    transport: T,
    store: Arc<StatusStore>,
    subscribers: Arc<SubscriberRegistry>,
    queue: Arc<CommandQueue>,
    connection_state: watch::Sender<ConnectionState>,
    /// Id of the most recent connection generation. Stamped on every
    /// submitted command.
    generation: AtomicU64,
    supervisor: Mutex<Option<SupervisorHandle>>,
}

struct SupervisorHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// How one connection generation ended.
enum GenerationEnd {
    Shutdown,
    Failed(Worker),
}

impl<T: Transport> Client<T> {
    /// Create a client. Does NOT connect -- call [`start()`](Self::start).
    pub fn new(config: ClientConfig, transport: T) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store: Arc::new(StatusStore::new()),
                subscribers: Arc::new(SubscriberRegistry::new()),
                queue: Arc::new(CommandQueue::new()),
                connection_state,
                generation: AtomicU64::new(0),
                supervisor: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the supervising loop. No-op while it is already running.
    pub async fn start(&self) {
        let mut slot = self.inner.supervisor.lock().await;
        if slot.as_ref().is_some_and(|s| !s.task.is_finished()) {
            debug!("client already running");
            return;
        }

        let cancel = CancellationToken::new();
        let task = tokio::spawn(supervise(Arc::clone(&self.inner), cancel.clone()));
        *slot = Some(SupervisorHandle { cancel, task });
        info!(
            host = %self.inner.config.host,
            port = self.inner.config.port,
            "client started"
        );
    }

    /// Stop the supervising loop and every worker.
    ///
    /// Returns once the loop has fully exited, whether it was connecting,
    /// connected, or waiting out a backoff. Concurrent callers wait for
    /// the same shutdown.
    pub async fn stop(&self) {
        let mut slot = self.inner.supervisor.lock().await;
        self.inner.set_state(ConnectionState::ShuttingDown);

        if let Some(supervisor) = slot.take() {
            supervisor.cancel.cancel();
            if let Err(e) = supervisor.task.await {
                warn!(error = %e, "supervisor task ended abnormally");
            }
            info!("client stopped");
        }

        self.inner.queue.drain(CommandError::ShuttingDown).await;
        self.inner.set_state(ConnectionState::ShuttingDown);
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Latest status of the current connection.
    pub fn status(&self) -> Option<Arc<Status>> {
        self.inner.store.latest()
    }

    /// Wall-clock time of the last decoded push.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_update()
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Queue a command for the current connection.
    ///
    /// Never waits for queue space. The returned handle always resolves:
    /// immediately with [`CommandError::NotConnected`] or
    /// [`CommandError::QueueFull`], otherwise once the device answered or
    /// the connection was lost.
    pub fn submit(&self, command: Command) -> PendingCommand {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return PendingCommand::failed(CommandError::NotConnected);
        }
        let generation = self.inner.generation.load(Ordering::SeqCst);
        self.inner.queue.push(command, generation)
    }

    pub async fn turn_on(&self) -> Result<(), CoreError> {
        self.execute("turn on", Command::power(true)).await
    }

    pub async fn turn_off(&self) -> Result<(), CoreError> {
        self.execute("turn off", Command::power(false)).await
    }

    pub async fn set_preset_mode(&self, mode: Mode) -> Result<(), CoreError> {
        self.execute("set preset mode", Command::preset_mode(mode))
            .await
    }

    /// Switch to manual mode at `speed`.
    pub async fn set_manual_speed(&self, speed: FanSpeed) -> Result<(), CoreError> {
        self.execute("set manual speed", Command::manual_speed(speed))
            .await
    }

    /// Submit, await, and log a failure.
    async fn execute(&self, operation: &'static str, command: Command) -> Result<(), CoreError> {
        match self.submit(command).await {
            Ok(true) => {
                debug!(operation, "command accepted");
                Ok(())
            }
            Ok(false) => {
                error!(operation, "purifier rejected command");
                Err(CoreError::CommandRejected { operation })
            }
            Err(source) => {
                error!(operation, error = %source, "command failed");
                Err(CoreError::Command { operation, source })
            }
        }
    }

    // ── Subscriptions ────────────────────────────────────────────

    /// Call `callback` with every decoded status. Must be called within a
    /// Tokio runtime.
    pub fn observe_status<F>(&self, id: ListenerId, callback: F)
    where
        F: Fn(Arc<Status>) + Send + 'static,
    {
        self.inner.subscribers.add_status_listener(id, callback);
    }

    pub fn stop_observing_status(&self, id: ListenerId) {
        self.inner.subscribers.remove_status_listener(id);
    }

    /// Call `callback` whenever an established connection is lost. Must
    /// be called within a Tokio runtime.
    pub fn observe_unavailable<F>(&self, id: ListenerId, callback: F)
    where
        F: Fn() + Send + 'static,
    {
        self.inner.subscribers.add_unavailable_listener(id, callback);
    }

    pub fn stop_observing_unavailable(&self, id: ListenerId) {
        self.inner.subscribers.remove_unavailable_listener(id);
    }
}

impl<T: Transport> ClientInner<T> {
    fn set_state(&self, state: ConnectionState) {
        let previous = self.connection_state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "connection state changed");
        }
    }
}

// ── Supervisor ───────────────────────────────────────────────────

/// Connect, run a generation, repeat. Only `cancel` ends the loop.
async fn supervise<T: Transport>(inner: Arc<ClientInner<T>>, cancel: CancellationToken) {
    let config = &inner.config;
    let mut attempt: u32 = 0;

    loop {
        inner.set_state(ConnectionState::Connecting);
        attempt = attempt.saturating_add(1);
        debug!(host = %config.host, port = config.port, attempt, "connecting");

        let connect = tokio::time::timeout(
            config.connect_timeout,
            inner
                .transport
                .connect(&config.host, config.port, config.connect_timeout),
        );
        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect => result.unwrap_or_else(|_| Err(airctl_api::Error::Timeout {
                timeout_secs: config.connect_timeout.as_secs(),
            })),
        };

        match connected {
            Ok(conn) => {
                attempt = 0;
                let started = Instant::now();
                match run_generation(&inner, Arc::new(conn), &cancel).await {
                    GenerationEnd::Shutdown => break,
                    GenerationEnd::Failed(worker) => {
                        // A generation that outlived one backoff period
                        // reconnects at once.
                        let wait = config.reconnect_backoff.saturating_sub(started.elapsed());
                        info!(%worker, wait_secs = wait.as_secs(), "reconnecting");
                        tokio::select! {
                            biased;
                            () = cancel.cancelled() => break,
                            () = tokio::time::sleep(wait) => {}
                        }
                    }
                }
            }
            Err(e) => {
                inner.set_state(ConnectionState::Disconnected);
                // Fail commands that slipped in behind the last teardown drain.
                inner.queue.drain(CommandError::ConnectionLost).await;
                warn!(
                    error = %e,
                    attempt,
                    backoff_secs = config.reconnect_backoff.as_secs(),
                    "connect failed, retrying after backoff"
                );
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(config.reconnect_backoff) => {}
                }
            }
        }
    }

    debug!("supervisor exited");
}

/// Run the three workers of one connection until one returns or
/// shutdown is requested, then tear the generation down.
async fn run_generation<T: Transport>(
    inner: &Arc<ClientInner<T>>,
    conn: Arc<T::Connection>,
    cancel: &CancellationToken,
) -> GenerationEnd {
    let config = &inner.config;
    let generation = inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
    let workers_cancel = cancel.child_token();
    let (fresh_writer, fresh_reader) = workers::freshness(Instant::now());

    let mut workers = JoinSet::new();
    workers.spawn(observer::observe_status(
        Arc::clone(&conn),
        Arc::clone(&inner.store),
        Arc::clone(&inner.subscribers),
        fresh_writer,
        workers_cancel.clone(),
    ));
    workers.spawn(watchdog::watch(
        fresh_reader,
        config.staleness_threshold,
        workers_cancel.clone(),
    ));
    workers.spawn(processor::process_commands(
        Arc::clone(&conn),
        Arc::clone(&inner.queue),
        generation,
        config.command_timeout,
        workers_cancel.clone(),
    ));

    inner.set_state(ConnectionState::Connected);
    info!(host = %config.host, port = config.port, generation, "connected to purifier");

    let end = tokio::select! {
        biased;
        () = cancel.cancelled() => GenerationEnd::Shutdown,
        joined = workers.join_next() => {
            let worker = match joined {
                Some(Ok(worker)) => worker,
                Some(Err(e)) => {
                    warn!(error = %e, "worker task failed");
                    Worker::Panicked
                }
                None => Worker::Panicked,
            };
            warn!(%worker, generation, "worker exited, tearing down connection");
            GenerationEnd::Failed(worker)
        }
    };

    // ── Teardown ──
    workers_cancel.cancel();
    let drained = tokio::time::timeout(config.shutdown_grace, async {
        while workers.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(
            grace_secs = config.shutdown_grace.as_secs(),
            "workers did not stop in time, aborting"
        );
        workers.abort_all();
        while workers.join_next().await.is_some() {}
    }

    if tokio::time::timeout(config.shutdown_grace, conn.shutdown())
        .await
        .is_err()
    {
        warn!("transport shutdown timed out");
    }
    drop(conn);
    inner.store.clear();

    if let GenerationEnd::Failed(_) = end {
        inner.set_state(ConnectionState::Disconnected);
        inner.queue.drain(CommandError::ConnectionLost).await;
        inner.subscribers.notify_unavailable();
        info!(generation, "disconnected from purifier");
    }

    end
}
