//! Profile configuration for airctl.
//!
//! TOML profiles, `AIRCTL_` environment overrides, and translation to
//! `airctl_core::ClientConfig`. The CLI adds flag-aware wrappers on top.
//!
//! ```toml
//! default_profile = "bedroom"
//!
//! [defaults]
//! output = "table"
//! staleness_threshold = 300
//!
//! [profiles.bedroom]
//! host = "192.168.1.40"
//!
//! [profiles.office]
//! host = "office-purifier.lan"
//! port = 15683
//! ```
//!
//! Environment variables use `__` to separate nesting levels, e.g.
//! `AIRCTL_DEFAULT_PROFILE=office` or `AIRCTL_DEFAULTS__PORT=15683`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use airctl_core::ClientConfig;
use airctl_core::config::{
    DEFAULT_COMMAND_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, DEFAULT_RECONNECT_BACKOFF,
    DEFAULT_SHUTDOWN_GRACE, DEFAULT_STALENESS_THRESHOLD,
};

const ENV_PREFIX: &str = "AIRCTL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no profile selected and no default_profile configured")]
    NoProfile,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named purifier profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Settings inherited by every profile. Durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    #[serde(default = "default_reconnect_backoff")]
    pub reconnect_backoff: u64,

    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold: u64,

    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            reconnect_backoff: default_reconnect_backoff(),
            staleness_threshold: default_staleness_threshold(),
            command_timeout: default_command_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}
fn default_reconnect_backoff() -> u64 {
    DEFAULT_RECONNECT_BACKOFF.as_secs()
}
fn default_staleness_threshold() -> u64 {
    DEFAULT_STALENESS_THRESHOLD.as_secs()
}
fn default_command_timeout() -> u64 {
    DEFAULT_COMMAND_TIMEOUT.as_secs()
}

/// A named purifier profile. Unset fields fall back to [`Defaults`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Hostname or IP address of the purifier (or its bridge).
    pub host: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconnect_backoff: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub staleness_threshold: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "airctl", "airctl").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("airctl");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment. A missing file is
/// not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// Pick the named profile, or the configured default.
pub fn resolve_profile<'a>(
    config: &'a Config,
    name: Option<&str>,
) -> Result<(String, &'a Profile), ConfigError> {
    let name = name
        .map(str::to_owned)
        .or_else(|| config.default_profile.clone())
        .ok_or(ConfigError::NoProfile)?;

    match config.profiles.get(&name) {
        Some(profile) => Ok((name, profile)),
        None => Err(ConfigError::UnknownProfile { name }),
    }
}

/// Build a `ClientConfig` from a profile and the global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }

    let port = profile.port.unwrap_or(defaults.port);
    if port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }

    Ok(ClientConfig {
        host: host.to_owned(),
        port,
        connect_timeout: seconds(
            "connect_timeout",
            profile.connect_timeout.unwrap_or(defaults.connect_timeout),
        )?,
        reconnect_backoff: seconds(
            "reconnect_backoff",
            profile.reconnect_backoff.unwrap_or(defaults.reconnect_backoff),
        )?,
        staleness_threshold: seconds(
            "staleness_threshold",
            profile
                .staleness_threshold
                .unwrap_or(defaults.staleness_threshold),
        )?,
        command_timeout: seconds(
            "command_timeout",
            profile.command_timeout.unwrap_or(defaults.command_timeout),
        )?,
        shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
    })
}

fn seconds(field: &str, value: u64) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(value))
}
