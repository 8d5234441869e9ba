// ── Runtime connection configuration ──
//
// Describes *how* the client talks to one purifier: where it lives and
// the timing knobs of the reconnect loop. Never touches disk; the CLI
// builds a `ClientConfig` from its profile file and hands it in.

use std::time::Duration;

pub use airctl_api::DEFAULT_PORT;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(10);
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(300);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Configuration for one purifier connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Hostname or IP address of the device (or its bridge).
    pub host: String,
    pub port: u16,
    /// Upper bound for a single `connect()` attempt.
    pub connect_timeout: Duration,
    /// Pause between failed connect attempts.
    pub reconnect_backoff: Duration,
    /// Maximum gap between status pushes before the connection is
    /// presumed dead.
    pub staleness_threshold: Duration,
    /// Upper bound for one `set_control_values` round trip.
    pub command_timeout: Duration,
    /// How long `stop()` waits for workers before aborting them.
    pub shutdown_grace: Duration,
}

impl ClientConfig {
    /// Defaults for everything except the host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reconnect_backoff: DEFAULT_RECONNECT_BACKOFF,
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("localhost")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_documented_defaults() {
        let config = ClientConfig::new("10.0.0.40");
        assert_eq!(config.host, "10.0.0.40");
        assert_eq!(config.port, 5683);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.reconnect_backoff, Duration::from_secs(10));
        assert_eq!(config.staleness_threshold, Duration::from_secs(300));
        assert_eq!(config.shutdown_grace, Duration::from_secs(5));
    }

    #[test]
    fn with_port_overrides_only_the_port() {
        let config = ClientConfig::new("purifier.local").with_port(15683);
        assert_eq!(config.port, 15683);
        assert_eq!(config.host, "purifier.local");
    }
}
