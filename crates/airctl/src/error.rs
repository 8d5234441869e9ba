//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use airctl_config::ConfigError;
use airctl_core::{CommandError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the purifier at {host}:{port}")]
    #[diagnostic(
        code(airctl::connection_failed),
        help(
            "Check that the purifier (or its bridge) is powered and reachable.\n\
             Try: airctl status --host <address> -v"
        )
    )]
    ConnectionFailed { host: String, port: u16 },

    #[error("Connection to the purifier was lost")]
    #[diagnostic(
        code(airctl::disconnected),
        help("The client reconnects automatically; retry the command.")
    )]
    Disconnected,

    // ── Commands ─────────────────────────────────────────────────────
    #[error("The purifier rejected '{operation}'")]
    #[diagnostic(code(airctl::rejected))]
    Rejected { operation: String },

    #[error("'{operation}' failed: {reason}")]
    #[diagnostic(code(airctl::command_failed))]
    CommandFailed { operation: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(airctl::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(airctl::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: airctl config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No purifier configured")]
    #[diagnostic(
        code(airctl::no_config),
        help(
            "Create a profile with: airctl config init\n\
             Or pass --host / set AIRCTL_HOST.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(airctl::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Timed out after {seconds}s waiting for {waiting_for}")]
    #[diagnostic(
        code(airctl::timeout),
        help("Increase the wait with --wait or check the purifier's network connection.")
    )]
    Timeout { seconds: u64, waiting_for: String },

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Cannot render output: {0}")]
    #[diagnostic(code(airctl::render))]
    Render(String),

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(airctl::prompt))]
    Prompt(#[from] dialoguer::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { host, port, .. } => {
                CliError::ConnectionFailed { host, port }
            }

            CoreError::Disconnected => CliError::Disconnected,

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
                waiting_for: "the purifier".into(),
            },

            CoreError::CommandRejected { operation } => CliError::Rejected {
                operation: operation.into(),
            },

            CoreError::Command { operation, source } => match source {
                CommandError::ConnectionLost => CliError::Disconnected,
                CommandError::TimedOut { timeout_secs } => CliError::Timeout {
                    seconds: timeout_secs,
                    waiting_for: format!("'{operation}' to be acknowledged"),
                },
                other => CliError::CommandFailed {
                    operation: operation.into(),
                    reason: other.to_string(),
                },
            },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::CommandFailed {
                operation: "internal".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(Box::new(other)),
        }
    }
}
