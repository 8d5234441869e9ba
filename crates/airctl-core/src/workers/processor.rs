// Command processor: the only writer to the connection.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use airctl_api::Connection;

use super::Worker;
use crate::command::CommandQueue;
use crate::error::CommandError;

/// Forward queued commands one at a time, in submission order.
///
/// Commands stamped with another generation are failed as
/// [`CommandError::Stale`] before anything is sent. A command in flight
/// when the generation is cancelled is failed as
/// [`CommandError::ConnectionLost`].
pub(crate) async fn process_commands<C: Connection>(
    conn: Arc<C>,
    queue: Arc<CommandQueue>,
    generation: u64,
    command_timeout: Duration,
    cancel: CancellationToken,
) -> Worker {
    let mut rx = queue.receiver().await;

    loop {
        let envelope = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                envelope
            }
        };

        if envelope.generation != generation {
            debug!(
                submitted_in = envelope.generation,
                generation, "failing command from previous connection"
            );
            envelope.reject(CommandError::Stale);
            continue;
        }

        let values = envelope.command.values().clone();
        debug!(?values, "sending control values");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                envelope.reject(CommandError::ConnectionLost);
                break;
            }
            outcome = tokio::time::timeout(command_timeout, conn.set_control_values(values)) => outcome,
        };

        match outcome {
            Ok(Ok(accepted)) => {
                debug!(accepted, "control values answered");
                envelope.resolve(Ok(accepted));
            }
            Ok(Err(e)) => {
                warn!(error = %e, "control request failed");
                envelope.reject(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_secs = command_timeout.as_secs(),
                    "control request timed out"
                );
                envelope.reject(CommandError::TimedOut {
                    timeout_secs: command_timeout.as_secs(),
                });
            }
        }
    }

    Worker::CommandProcessor
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use airctl_api::{ControlValues, StatusStream};

    use super::*;
    use crate::command::Command;

    #[derive(Default)]
    struct RecordingConnection {
        sent: Mutex<Vec<ControlValues>>,
    }

    impl Connection for RecordingConnection {
        fn observe_status(&self) -> StatusStream {
            Box::pin(futures_util::stream::pending())
        }

        async fn set_control_values(
            &self,
            values: ControlValues,
        ) -> Result<bool, airctl_api::Error> {
            self.sent.lock().unwrap().push(values);
            Ok(true)
        }

        async fn shutdown(&self) {}
    }

    #[tokio::test(start_paused = true)]
    async fn commands_from_previous_generation_are_stale() {
        let conn = Arc::new(RecordingConnection::default());
        let queue = Arc::new(CommandQueue::new());
        let cancel = CancellationToken::new();

        let leftover = queue.push(Command::power(false), 1);
        let current = queue.push(Command::power(true), 2);

        let task = tokio::spawn(process_commands(
            Arc::clone(&conn),
            Arc::clone(&queue),
            2,
            Duration::from_secs(30),
            cancel.clone(),
        ));

        assert_eq!(leftover.await, Err(CommandError::Stale));
        assert_eq!(current.await, Ok(true));

        let sent = conn.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![Command::power(true).into_values()]);

        cancel.cancel();
        assert_eq!(task.await.unwrap(), Worker::CommandProcessor);
    }
}
