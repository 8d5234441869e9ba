//! Clap derive structures for the `airctl` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use airctl_core::{FanSpeed, Mode};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// airctl -- monitor and control an air purifier from the command line
#[derive(Debug, Parser)]
#[command(
    name = "airctl",
    version,
    about = "Monitor and control an air purifier from the command line",
    long_about = "Talks to a purifier through a CoAP bridge, keeps the connection alive\n\
        across network hiccups, and reports status pushes as they arrive.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Purifier profile to use
    #[arg(long, short = 'p', env = "AIRCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Purifier (or bridge) host (overrides profile)
    #[arg(long, short = 'H', env = "AIRCTL_HOST", global = true)]
    pub host: Option<String>,

    /// Purifier (or bridge) port (overrides profile)
    #[arg(long, short = 'P', env = "AIRCTL_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AIRCTL_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Seconds to wait for the purifier to connect or report
    #[arg(long, short = 'w', env = "AIRCTL_WAIT", default_value = "15", global = true)]
    pub wait: u64,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain `key=value` text (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for the next status push and print it
    #[command(alias = "st")]
    Status,

    /// Stream status pushes and connection changes until Ctrl-C
    Watch,

    /// Turn the purifier on
    On,

    /// Turn the purifier off
    Off,

    /// Switch to a preset operating mode
    Mode(ModeArgs),

    /// Switch to manual mode at a fixed fan speed
    Speed(SpeedArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONTROL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ModeArgs {
    /// Operating mode
    pub mode: ModeArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Auto,
    Allergen,
    Bacteria,
    Sleep,
    Night,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Auto => Mode::Auto,
            ModeArg::Allergen => Mode::Allergen,
            ModeArg::Bacteria => Mode::Bacteria,
            ModeArg::Sleep => Mode::Sleep,
            ModeArg::Night => Mode::Night,
        }
    }
}

#[derive(Debug, Args)]
pub struct SpeedArgs {
    /// Fan speed
    pub speed: SpeedArg,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SpeedArg {
    Silent,
    #[value(name = "1", alias = "speed1")]
    Speed1,
    #[value(name = "2", alias = "speed2")]
    Speed2,
    #[value(name = "3", alias = "speed3")]
    Speed3,
    Turbo,
}

impl From<SpeedArg> for FanSpeed {
    fn from(arg: SpeedArg) -> Self {
        match arg {
            SpeedArg::Silent => FanSpeed::Silent,
            SpeedArg::Speed1 => FanSpeed::Speed1,
            SpeedArg::Speed2 => FanSpeed::Speed2,
            SpeedArg::Speed3 => FanSpeed::Speed3,
            SpeedArg::Turbo => FanSpeed::Turbo,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or extend the config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
