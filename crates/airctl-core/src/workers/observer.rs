// Status observer: the only reader of the connection.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use airctl_api::Connection;

use super::{FreshnessWriter, Worker};
use crate::convert::decode_status;
use crate::store::StatusStore;
use crate::subscribers::SubscriberRegistry;

/// Decode and fan out pushes until the stream ends, errors, or the
/// generation is cancelled. Undecodable pushes are skipped.
pub(crate) async fn observe_status<C: Connection>(
    conn: Arc<C>,
    store: Arc<StatusStore>,
    subscribers: Arc<SubscriberRegistry>,
    freshness: FreshnessWriter,
    cancel: CancellationToken,
) -> Worker {
    let mut pushes = conn.observe_status();

    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = pushes.next() => next,
        };

        match next {
            Some(Ok(raw)) => match decode_status(raw) {
                Ok(status) => {
                    freshness.touch();
                    let status = Arc::new(status);
                    debug!(
                        is_on = status.is_on,
                        mode = %status.mode,
                        fan_speed = %status.fan_speed,
                        "status push"
                    );
                    store.replace(Arc::clone(&status));
                    subscribers.publish_status(&status);
                }
                Err(e) => debug!(error = %e, "skipping undecodable status push"),
            },
            Some(Err(e)) => {
                warn!(error = %e, "status stream failed");
                break;
            }
            None => {
                info!("status stream ended");
                break;
            }
        }
    }

    Worker::StatusObserver
}
