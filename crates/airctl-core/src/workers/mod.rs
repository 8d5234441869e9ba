// ── Per-connection workers ──
//
// Each connection generation runs three sibling tasks. Any of them
// returning is the signal that the generation is over; the supervisor
// then cancels the rest and reconnects.

pub(crate) mod observer;
pub(crate) mod processor;
pub(crate) mod watchdog;

use strum::Display;
use tokio::sync::watch;
use tokio::time::Instant;

/// Which worker ended a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Worker {
    StatusObserver,
    Watchdog,
    CommandProcessor,
    /// The task panicked or was aborted; its identity is lost.
    Panicked,
}

// ── Freshness ────────────────────────────────────────────────────────

/// Write side of the "last push seen" timestamp. Owned by the observer.
pub(crate) struct FreshnessWriter(watch::Sender<Instant>);

/// Read side of the "last push seen" timestamp. Owned by the watchdog.
pub(crate) struct FreshnessReader(watch::Receiver<Instant>);

/// New freshness pair, seeded with `since` (usually the connect time).
pub(crate) fn freshness(since: Instant) -> (FreshnessWriter, FreshnessReader) {
    let (tx, rx) = watch::channel(since);
    (FreshnessWriter(tx), FreshnessReader(rx))
}

impl FreshnessWriter {
    pub(crate) fn touch(&self) {
        self.0.send_replace(Instant::now());
    }
}

impl FreshnessReader {
    pub(crate) fn last_seen(&self) -> Instant {
        *self.0.borrow()
    }
}
