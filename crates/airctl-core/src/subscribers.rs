// ── Subscriber registry ──
//
// Two independent id → callback maps: status listeners and "connection
// lost" listeners. Each listener gets its own unbounded channel and
// delivery task, so one slow callback never holds up the others and each
// listener sees events in publish order.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::model::{ListenerId, Status};

/// A registered callback and the task that feeds it.
///
/// Dropping the listener aborts its task; events still queued for it
/// are discarded.
struct Listener<E> {
    tx: mpsc::UnboundedSender<E>,
    task: JoinHandle<()>,
}

impl<E: Send + 'static> Listener<E> {
    fn spawn<F>(callback: F) -> Self
    where
        F: Fn(E) + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<E>();
        let task = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                callback(event);
            }
        });
        Self { tx, task }
    }

    fn deliver(&self, event: E) {
        // Fails only if the callback panicked and took its task down.
        if self.tx.send(event).is_err() {
            trace!("listener task gone, dropping event");
        }
    }
}

impl<E> Drop for Listener<E> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Instance-owned listener maps for one client.
///
/// Registration spawns a delivery task and therefore must happen inside
/// a Tokio runtime.
pub struct SubscriberRegistry {
    status: DashMap<ListenerId, Listener<Arc<Status>>>,
    unavailable: DashMap<ListenerId, Listener<()>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self {
            status: DashMap::new(),
            unavailable: DashMap::new(),
        }
    }

    // ── Status listeners ─────────────────────────────────────────────

    /// Register `callback` for every decoded status. Reusing an id
    /// replaces the earlier callback.
    pub fn add_status_listener<F>(&self, id: ListenerId, callback: F)
    where
        F: Fn(Arc<Status>) + Send + 'static,
    {
        if self.status.insert(id, Listener::spawn(callback)).is_some() {
            debug!(%id, "replaced status listener");
        }
    }

    /// No-op for unknown ids.
    pub fn remove_status_listener(&self, id: ListenerId) {
        self.status.remove(&id);
    }

    pub(crate) fn publish_status(&self, status: &Arc<Status>) {
        for listener in self.status.iter() {
            listener.deliver(Arc::clone(status));
        }
    }

    pub fn status_listener_count(&self) -> usize {
        self.status.len()
    }

    // ── Unavailable listeners ────────────────────────────────────────

    /// Register `callback` for connection loss (worker failure or
    /// staleness). Reusing an id replaces the earlier callback.
    pub fn add_unavailable_listener<F>(&self, id: ListenerId, callback: F)
    where
        F: Fn() + Send + 'static,
    {
        let listener = Listener::spawn(move |()| callback());
        if self.unavailable.insert(id, listener).is_some() {
            debug!(%id, "replaced unavailable listener");
        }
    }

    /// No-op for unknown ids.
    pub fn remove_unavailable_listener(&self, id: ListenerId) {
        self.unavailable.remove(&id);
    }

    pub(crate) fn notify_unavailable(&self) {
        for listener in self.unavailable.iter() {
            listener.deliver(());
        }
    }

    pub fn unavailable_listener_count(&self) -> usize {
        self.unavailable.len()
    }
}

impl Default for SubscriberRegistry {
    fn default() -> Self {
        Self::new()
    }
}
