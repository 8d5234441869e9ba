// Staleness watchdog. The device protocol has no keep-alive, so a
// connection that stops pushing is indistinguishable from a dead one.

use std::time::Duration;

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::{FreshnessReader, Worker};

/// Sleep until `last_seen + threshold`; return once no push has arrived
/// for at least `threshold`, or when cancelled.
pub(crate) async fn watch(
    freshness: FreshnessReader,
    threshold: Duration,
    cancel: CancellationToken,
) -> Worker {
    loop {
        let deadline = freshness.last_seen() + threshold;

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep_until(deadline) => {
                let silent_for = Instant::now().saturating_duration_since(freshness.last_seen());
                if silent_for >= threshold {
                    warn!(
                        silent_secs = silent_for.as_secs(),
                        threshold_secs = threshold.as_secs(),
                        "no status push within staleness threshold"
                    );
                    break;
                }
                trace!(silent_secs = silent_for.as_secs(), "push seen, re-arming watchdog");
            }
        }
    }

    Worker::Watchdog
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::workers::freshness;

    const THRESHOLD: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn fires_after_threshold_without_pushes() {
        let start = Instant::now();
        let (_writer, reader) = freshness(start);

        let worker = watch(reader, THRESHOLD, CancellationToken::new()).await;

        assert_eq!(worker, Worker::Watchdog);
        assert_eq!(start.elapsed(), THRESHOLD);
    }

    #[tokio::test(start_paused = true)]
    async fn pushes_postpone_the_deadline() {
        let start = Instant::now();
        let (writer, reader) = freshness(start);
        let task = tokio::spawn(watch(reader, THRESHOLD, CancellationToken::new()));

        tokio::time::sleep(Duration::from_secs(200)).await;
        writer.touch();
        tokio::time::sleep(Duration::from_secs(200)).await;
        assert!(!task.is_finished());

        task.await.unwrap();
        assert_eq!(start.elapsed(), Duration::from_secs(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_immediately() {
        let start = Instant::now();
        let (_writer, reader) = freshness(start);
        let cancel = CancellationToken::new();
        cancel.cancel();

        watch(reader, THRESHOLD, cancel).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
