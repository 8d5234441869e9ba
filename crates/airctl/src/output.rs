//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders purifier status in the format selected by `--output`. Table
//! uses `tabled`, structured formats use serde, plain emits `key=value`
//! lines for scripting.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use airctl_core::Status;

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

fn power_label(is_on: bool, color: bool) -> String {
    match (is_on, color) {
        (true, true) => "on".green().bold().to_string(),
        (false, true) => "off".red().to_string(),
        (true, false) => "on".into(),
        (false, false) => "off".into(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// Render a status snapshot in the chosen format.
pub fn render_status(
    format: OutputFormat,
    status: &Status,
    color: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(status_table(status, color)),
        OutputFormat::Json => render_json(status, false),
        OutputFormat::JsonCompact => render_json(status, true),
        OutputFormat::Yaml => render_yaml(status),
        OutputFormat::Plain => Ok(status_plain(status)),
    }
}

/// One-line summary for streaming output.
pub fn status_line(status: &Status, color: bool) -> String {
    let name = if color {
        status.name.bold().to_string()
    } else {
        status.name.clone()
    };
    format!(
        "{name}: power={} mode={} fan={}",
        power_label(status.is_on, color),
        status.mode,
        status.fan_speed,
    )
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn status_table(status: &Status, color: bool) -> String {
    let rows = [
        FieldRow {
            field: "Name",
            value: status.name.clone(),
        },
        FieldRow {
            field: "Power",
            value: power_label(status.is_on, color),
        },
        FieldRow {
            field: "Mode",
            value: status.mode.to_string(),
        },
        FieldRow {
            field: "Fan speed",
            value: status.fan_speed.to_string(),
        },
        FieldRow {
            field: "Model",
            value: status.model.clone(),
        },
        FieldRow {
            field: "Device ID",
            value: status.device_id.clone(),
        },
        FieldRow {
            field: "Firmware",
            value: status.firmware_version.clone(),
        },
        FieldRow {
            field: "Wi-Fi firmware",
            value: status.wifi_version.clone(),
        },
    ];
    Table::new(rows).with(Style::rounded()).to_string()
}

fn status_plain(status: &Status) -> String {
    [
        format!("name={}", status.name),
        format!("power={}", if status.is_on { "on" } else { "off" }),
        format!("mode={}", status.mode),
        format!("fan_speed={}", status.fan_speed),
        format!("model={}", status.model),
        format!("device_id={}", status.device_id),
    ]
    .join("\n")
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> Result<String, CliError> {
    let rendered = if compact {
        serde_json::to_string(data)
    } else {
        serde_json::to_string_pretty(data)
    };
    rendered.map_err(|e| CliError::Render(e.to_string()))
}

fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> Result<String, CliError> {
    serde_yaml::to_string(data).map_err(|e| CliError::Render(e.to_string()))
}
