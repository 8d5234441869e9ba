//! Command dispatch: bridges CLI args -> client operations -> output formatting.

pub mod config_cmd;
pub mod control;
pub mod status;
pub mod watch;

use std::time::Duration;

use airctl_api::LineTransport;
use airctl_core::{Client, ConnectionState};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub type PurifierClient = Client<LineTransport>;

/// Dispatch a purifier-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &PurifierClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(client, global).await,
        Command::Watch => watch::handle(client, global).await,
        Command::On => control::turn_on(client, global).await,
        Command::Off => control::turn_off(client, global).await,
        Command::Mode(args) => control::set_mode(client, args, global).await,
        Command::Speed(args) => control::set_speed(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

/// Block until the client reports `Connected`, or `--wait` runs out.
pub(crate) async fn wait_connected(
    client: &PurifierClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut state = client.connection_state();
    let waited = tokio::time::timeout(
        Duration::from_secs(global.wait),
        state.wait_for(|s| *s == ConnectionState::Connected),
    )
    .await;

    match waited {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(CliError::Disconnected),
        Err(_) => Err(CliError::Timeout {
            seconds: global.wait,
            waiting_for: format!(
                "a connection to {}:{}",
                client.config().host,
                client.config().port
            ),
        }),
    }
}
