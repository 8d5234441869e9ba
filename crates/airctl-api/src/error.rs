use thiserror::Error;

/// Top-level error type for the `airctl-api` crate.
///
/// Covers every failure a transport can report: establishing the
/// connection, moving bytes, and making sense of what the device sent.
/// `airctl-core` maps these into its own domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// TCP/UDP connect failed (refused, unreachable, DNS failure, etc.)
    #[error("Cannot connect to {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    /// Connect or request did not complete in time.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Socket-level failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection (or it was shut down locally)
    /// while a request was outstanding.
    #[error("Connection closed")]
    Closed,

    // ── Streams ─────────────────────────────────────────────────────
    /// `observe_status` was called twice on the same connection.
    #[error("Status stream already taken for this connection")]
    StreamTaken,

    // ── Data ────────────────────────────────────────────────────────
    /// Framing or message-level violation.
    #[error("Protocol error: {message}")]
    Protocol { message: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying
    /// with a fresh connection.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Timeout { .. } | Self::Io(_) | Self::Closed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_and_timeout_are_transient() {
        let connect = Error::Connect {
            host: "10.0.0.2".into(),
            port: 5683,
            reason: "refused".into(),
        };
        assert!(connect.is_transient());
        assert!(Error::Timeout { timeout_secs: 10 }.is_transient());
        assert!(Error::Closed.is_transient());
    }

    #[test]
    fn data_errors_are_not_transient() {
        assert!(!Error::StreamTaken.is_transient());
        assert!(
            !Error::Protocol {
                message: "bad frame".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn connect_error_message_names_endpoint() {
        let err = Error::Connect {
            host: "purifier.local".into(),
            port: 5683,
            reason: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Cannot connect to purifier.local:5683: connection refused"
        );
    }
}
