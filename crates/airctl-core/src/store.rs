// ── Latest-status store ──
//
// Lock-free holder for the most recent decoded `Status`. Written only by
// the status observer; read by anyone. The wall-clock time of the last
// push is broadcast through a `watch` channel.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::Status;

pub struct StatusStore {
    latest: ArcSwapOption<Status>,
    last_update: watch::Sender<Option<DateTime<Utc>>>,
}

impl StatusStore {
    pub fn new() -> Self {
        let (last_update, _) = watch::channel(None);
        Self {
            latest: ArcSwapOption::empty(),
            last_update,
        }
    }

    /// Most recent status of the current connection, if any push has
    /// been decoded since it was established.
    pub fn latest(&self) -> Option<Arc<Status>> {
        self.latest.load_full()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.borrow()
    }

    pub fn subscribe_last_update(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_update.subscribe()
    }

    /// Time elapsed since the last decoded push.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_update().map(|at| Utc::now() - at)
    }

    pub(crate) fn replace(&self, status: Arc<Status>) {
        self.latest.store(Some(status));
        self.last_update.send_replace(Some(Utc::now()));
    }

    /// Forget the snapshot. `last_update` is kept so callers can still
    /// tell how old the last known state is.
    pub(crate) fn clear(&self) {
        self.latest.store(None);
    }
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FanSpeed, Mode};

    fn sample(is_on: bool) -> Arc<Status> {
        Arc::new(Status {
            device_id: "a1b2c3".into(),
            name: "Bedroom".into(),
            model: "AC2729/10".into(),
            firmware_version: "1.0.7".into(),
            wifi_version: "AWS_Philips_AIR@62.1".into(),
            is_on,
            mode: Mode::Sleep,
            fan_speed: FanSpeed::Silent,
        })
    }

    #[test]
    fn starts_empty() {
        let store = StatusStore::new();
        assert!(store.latest().is_none());
        assert!(store.last_update().is_none());
        assert!(store.data_age().is_none());
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let store = StatusStore::new();
        let first = sample(true);
        store.replace(Arc::clone(&first));
        let held = store.latest();

        store.replace(sample(false));

        // Readers holding the old snapshot keep seeing it unchanged.
        assert!(held.is_some_and(|s| s.is_on));
        assert!(store.latest().is_some_and(|s| !s.is_on));
        assert!(store.last_update().is_some());
    }

    #[test]
    fn clear_keeps_last_update() {
        let store = StatusStore::new();
        store.replace(sample(true));
        store.clear();
        assert!(store.latest().is_none());
        assert!(store.last_update().is_some());
    }
}
