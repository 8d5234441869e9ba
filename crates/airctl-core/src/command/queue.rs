// ── Command queue ──
//
// Bounded FIFO shared by callers and the command processor. Owned by the
// client for its whole lifetime; the receiving end is borrowed by one
// processor at a time through an async mutex.

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tracing::debug;

use super::{Command, CommandEnvelope, PendingCommand};
use crate::error::CommandError;

pub(crate) const COMMAND_CHANNEL_SIZE: usize = 64;

pub struct CommandQueue {
    tx: mpsc::Sender<CommandEnvelope>,
    rx: Mutex<mpsc::Receiver<CommandEnvelope>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::with_capacity(COMMAND_CHANNEL_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Enqueue without waiting. A full queue resolves the returned handle
    /// with [`CommandError::QueueFull`].
    pub(crate) fn push(&self, command: Command, generation: u64) -> PendingCommand {
        let (envelope, pending) = CommandEnvelope::new(command, generation);
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                debug!(generation, "command queue full");
                envelope.reject(CommandError::QueueFull);
            }
            Err(TrySendError::Closed(envelope)) => envelope.reject(CommandError::ShuttingDown),
        }
        pending
    }

    /// Exclusive access to the receiving end. Held by the command
    /// processor for the lifetime of its generation.
    pub(crate) async fn receiver(&self) -> MutexGuard<'_, mpsc::Receiver<CommandEnvelope>> {
        self.rx.lock().await
    }

    /// Resolve everything still queued with `reason`. Returns how many
    /// commands were failed.
    pub(crate) async fn drain(&self, reason: CommandError) -> usize {
        let mut rx = self.receiver().await;
        drain_pending(&mut rx, &reason)
    }

    /// Number of commands waiting to be processed.
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn drain_pending(
    rx: &mut mpsc::Receiver<CommandEnvelope>,
    reason: &CommandError,
) -> usize {
    let mut drained = 0;
    while let Ok(envelope) = rx.try_recv() {
        envelope.reject(reason.clone());
        drained += 1;
    }
    if drained > 0 {
        debug!(drained, %reason, "failed queued commands");
    }
    drained
}
