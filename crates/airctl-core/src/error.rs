// ── Core error types ──
//
// User-facing errors from airctl-core. Consumers never see raw socket or
// JSON failures directly; `From<airctl_api::Error>` translates
// transport-layer errors into domain variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to purifier at {host}:{port}: {reason}")]
    ConnectionFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Purifier connection timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Purifier disconnected")]
    Disconnected,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{operation} failed: {source}")]
    Command {
        operation: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("{operation} was rejected by the purifier")]
    CommandRejected { operation: &'static str },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a submitted command did not produce a device answer.
///
/// Delivered through the command's result slot. Cloneable so one drain
/// reason can be handed to every queued command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("not connected to the purifier")]
    NotConnected,

    #[error("command queue is full")]
    QueueFull,

    #[error("connection lost before the command completed")]
    ConnectionLost,

    /// Left over from an earlier connection generation.
    #[error("command was queued on a previous connection")]
    Stale,

    #[error("no answer within {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("client is shutting down")]
    ShuttingDown,
}

/// A status push that could not be turned into a [`Status`](crate::Status).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed status payload: {message}")]
    Malformed { message: String },

    #[error("unknown {field} value {value:?}")]
    InvalidValue { field: &'static str, value: String },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<airctl_api::Error> for CoreError {
    fn from(err: airctl_api::Error) -> Self {
        match err {
            airctl_api::Error::Connect { host, port, reason } => {
                CoreError::ConnectionFailed { host, port, reason }
            }
            airctl_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            airctl_api::Error::Closed | airctl_api::Error::Io(_) => CoreError::Disconnected,
            other => CoreError::Internal(other.to_string()),
        }
    }
}

impl From<airctl_api::Error> for CommandError {
    fn from(err: airctl_api::Error) -> Self {
        match err {
            airctl_api::Error::Closed => CommandError::ConnectionLost,
            airctl_api::Error::Timeout { timeout_secs } => CommandError::TimedOut { timeout_secs },
            other => CommandError::Transport {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_keeps_endpoint() {
        let err: CoreError = airctl_api::Error::Connect {
            host: "10.0.0.40".into(),
            port: 5683,
            reason: "refused".into(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::ConnectionFailed { ref host, port: 5683, .. } if host == "10.0.0.40"
        ));
    }

    #[test]
    fn closed_transport_means_connection_lost() {
        let err: CommandError = airctl_api::Error::Closed.into();
        assert_eq!(err, CommandError::ConnectionLost);
    }

    #[test]
    fn other_transport_errors_carry_message() {
        let err: CommandError = airctl_api::Error::Protocol {
            message: "bad frame".into(),
        }
        .into();
        assert_eq!(
            err,
            CommandError::Transport {
                message: "Protocol error: bad frame".into()
            }
        );
    }

    #[test]
    fn command_error_names_operation() {
        let err = CoreError::Command {
            operation: "turn on",
            source: CommandError::NotConnected,
        };
        assert_eq!(err.to_string(), "turn on failed: not connected to the purifier");
    }
}
