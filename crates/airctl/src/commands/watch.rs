//! `airctl watch`: stream status pushes and availability until Ctrl-C.

use std::sync::Arc;

use chrono::Local;
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

use airctl_core::{ConnectionState, ListenerId, Status};

use super::PurifierClient;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

enum WatchEvent {
    Status(Arc<Status>),
    Unavailable,
}

pub async fn handle(client: &PurifierClient, global: &GlobalOpts) -> Result<(), CliError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let status_id = ListenerId::new();
    let unavailable_id = ListenerId::new();

    let status_tx = tx.clone();
    client.observe_status(status_id, move |status| {
        let _ = status_tx.send(WatchEvent::Status(status));
    });
    client.observe_unavailable(unavailable_id, move || {
        let _ = tx.send(WatchEvent::Unavailable);
    });

    let color = output::should_color(global.color);
    let mut state = client.connection_state();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            signal = &mut ctrl_c => {
                break signal.map_err(CliError::from);
            }
            Some(event) = rx.recv() => {
                if let Err(e) = print_event(&event, global, color) {
                    break Err(e);
                }
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let current = *state.borrow_and_update();
                if !global.quiet && current == ConnectionState::Connected {
                    eprintln!("{}", connection_notice(client, color));
                }
            }
        }
    };

    client.stop_observing_status(status_id);
    client.stop_observing_unavailable(unavailable_id);
    result
}

fn print_event(event: &WatchEvent, global: &GlobalOpts, color: bool) -> Result<(), CliError> {
    match event {
        WatchEvent::Status(status) => {
            let rendered = match global.output {
                OutputFormat::Table => format!(
                    "{} {}",
                    Local::now().format("%H:%M:%S"),
                    output::status_line(status, color)
                ),
                // One document per push
                OutputFormat::Json | OutputFormat::JsonCompact => {
                    output::render_status(OutputFormat::JsonCompact, status, color)?
                }
                other => output::render_status(other, status, color)?,
            };
            output::print_output(&rendered, global.quiet);
        }
        WatchEvent::Unavailable => {
            if !global.quiet {
                let notice = "purifier unavailable, reconnecting";
                if color {
                    eprintln!("{}", notice.yellow());
                } else {
                    eprintln!("{notice}");
                }
            }
        }
    }
    Ok(())
}

fn connection_notice(client: &PurifierClient, color: bool) -> String {
    let cfg = client.config();
    let notice = format!("connected to {}:{}", cfg.host, cfg.port);
    if color {
        notice.green().to_string()
    } else {
        notice
    }
}
