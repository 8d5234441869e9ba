// ── Command API ──
//
// Every write to the purifier is a `Command`: an opaque set of control
// values plus a single-use result slot. Commands flow through the
// `CommandQueue` to the per-connection processor, which resolves the
// slot exactly once.

pub mod queue;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;

use airctl_api::ControlValues;

use crate::error::CommandError;
use crate::model::{FanSpeed, Mode};

pub use queue::CommandQueue;

/// Outcome of one command: the device's accept flag, or why no answer
/// was obtained.
pub type CommandResult = Result<bool, CommandError>;

/// Control values destined for `Connection::set_control_values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    values: ControlValues,
}

impl Command {
    pub fn new(values: ControlValues) -> Self {
        Self { values }
    }

    /// `pwr` = `"1"` / `"0"`.
    pub fn power(on: bool) -> Self {
        Self::from_pairs([("pwr", if on { "1" } else { "0" })])
    }

    pub fn preset_mode(mode: Mode) -> Self {
        Self::from_pairs([("mode", mode.code())])
    }

    /// Manual speed implies manual mode, so both keys are sent together.
    pub fn manual_speed(speed: FanSpeed) -> Self {
        Self::from_pairs([("mode", Mode::Manual.code()), ("om", speed.code())])
    }

    pub fn values(&self) -> &ControlValues {
        &self.values
    }

    pub fn into_values(self) -> ControlValues {
        self.values
    }

    fn from_pairs<const N: usize>(pairs: [(&str, &str); N]) -> Self {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key.to_owned(), Value::String(value.to_owned())))
            .collect();
        Self { values }
    }
}

impl From<ControlValues> for Command {
    fn from(values: ControlValues) -> Self {
        Self::new(values)
    }
}

// ── Envelope ─────────────────────────────────────────────────────────

/// A command envelope sent through the command channel.
/// Carries the generation it was submitted in and the response slot.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub generation: u64,
    pub response_tx: oneshot::Sender<CommandResult>,
}

impl CommandEnvelope {
    pub(crate) fn new(command: Command, generation: u64) -> (Self, PendingCommand) {
        let (response_tx, response_rx) = oneshot::channel();
        let envelope = Self {
            command,
            generation,
            response_tx,
        };
        (envelope, PendingCommand { rx: response_rx })
    }

    pub(crate) fn resolve(self, result: CommandResult) {
        // The caller may have dropped its handle; nothing to report then.
        let _ = self.response_tx.send(result);
    }

    pub(crate) fn reject(self, error: CommandError) {
        self.resolve(Err(error));
    }
}

// ── PendingCommand ───────────────────────────────────────────────────

/// Awaitable result of [`Client::submit`](crate::Client::submit).
///
/// Always completes: if the client drops the command without answering
/// it, the result is [`CommandError::ConnectionLost`].
#[derive(Debug)]
#[must_use = "a submitted command does nothing unless its result is awaited or dropped deliberately"]
pub struct PendingCommand {
    rx: oneshot::Receiver<CommandResult>,
}

impl PendingCommand {
    /// A handle that is already resolved with `error`.
    pub(crate) fn failed(error: CommandError) -> Self {
        let (envelope, pending) = CommandEnvelope::new(Command::new(ControlValues::new()), 0);
        envelope.reject(error);
        pending
    }
}

impl Future for PendingCommand {
    type Output = CommandResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(CommandError::ConnectionLost)))
    }
}
