//! `airctl status`: print the first status push after connecting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use airctl_core::{ListenerId, Status};

use super::PurifierClient;
use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(client: &PurifierClient, global: &GlobalOpts) -> Result<(), CliError> {
    let status = first_status(client, Duration::from_secs(global.wait)).await?;

    let color = output::should_color(global.color);
    let rendered = output::render_status(global.output, &status, color)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

/// Wait for a status snapshot. Registers before reading the store so a
/// push that lands in between is not missed.
async fn first_status(client: &PurifierClient, wait: Duration) -> Result<Arc<Status>, CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = ListenerId::new();
    client.observe_status(id, move |status| {
        let _ = tx.send(status);
    });

    let result = match client.status() {
        Some(status) => Ok(status),
        None => match tokio::time::timeout(wait, rx.recv()).await {
            Ok(Some(status)) => Ok(status),
            Ok(None) => Err(CliError::Disconnected),
            Err(_) => Err(CliError::Timeout {
                seconds: wait.as_secs(),
                waiting_for: format!(
                    "a status report from {}:{}",
                    client.config().host,
                    client.config().port
                ),
            }),
        },
    };

    client.stop_observing_status(id);
    result
}
