//! Resilient connection layer between `airctl-api` transports and
//! consumers (the CLI, or any embedding application).
//!
//! - **[`Client`]** — Connection supervisor. [`start()`](Client::start)
//!   spawns a loop that connects, runs one *generation* of workers, and
//!   reconnects whenever a generation ends. Only
//!   [`stop()`](Client::stop) ends the loop.
//!
//! - **Workers** — Per generation, three sibling tasks: the status
//!   observer (decodes pushes, updates freshness, fans out), the staleness
//!   watchdog (fires when no push arrived within the threshold), and the
//!   command processor (forwards queued commands in order). The first one
//!   to return tears the generation down.
//!
//! - **[`CommandQueue`]** — Bounded `mpsc` queue of [`Command`]s, each
//!   with a `oneshot` result slot surfaced as [`PendingCommand`]. Commands
//!   that outlive their generation are failed explicitly, never left
//!   pending.
//!
//! - **[`SubscriberRegistry`]** — Status and "unavailable" listeners keyed
//!   by [`ListenerId`], each delivered on its own task.
//!
//! - **[`StatusStore`]** — Lock-free holder of the latest [`Status`].

pub mod client;
pub mod command;
pub mod config;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod subscribers;
mod workers;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{Client, ConnectionState};
pub use command::{Command, CommandQueue, CommandResult, PendingCommand};
pub use config::ClientConfig;
pub use convert::decode_status;
pub use error::{CommandError, CoreError, DecodeError};
pub use model::{FanSpeed, ListenerId, Mode, Status};
pub use store::StatusStore;
pub use subscribers::SubscriberRegistry;
