//! Clap derive structures for the `kioskly` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// kioskly -- watch and control kiosk tablets over their HTTP API
#[derive(Debug, Parser)]
#[command(
    name = "kioskly",
    version,
    about = "Monitor and control kiosk tablets from the command line",
    long_about = "Polls kiosk devices for status and health, and sends control commands\n\
        (screen, brightness, volume, URL, audio, remote keys) through their REST API.",
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
    /// Device profile to use
    #[arg(long, short = 'd', env = "KIOSKLY_DEVICE", global = true)]
    pub device: Option<String>,

    /// Device base URL (overrides profile)
    #[arg(long, short = 'u', env = "KIOSKLY_URL", global = true)]
    pub url: Option<String>,

    /// Device API key
    #[arg(long, env = "KIOSKLY_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "KIOSKLY_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "KIOSKLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
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
    /// Plain text, one value per line (scripting)
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch status and health once and show the device values
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Verify the device is reachable and accepts the API key
    Check,

    /// Save a screenshot of the device screen
    #[command(alias = "shot")]
    Screenshot(ScreenshotArgs),

    /// Send a command to the device
    #[command(alias = "x")]
    Exec(ExecArgs),

    /// List the commands `exec` accepts
    #[command(alias = "ls")]
    Commands,

    /// Poll devices continuously and report every state change
    Watch(WatchArgs),

    /// Manage kioskly configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STATUS / SCREENSHOT / EXEC / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Print the merged status document instead of the extracted values
    #[arg(long)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct ScreenshotArgs {
    /// Output file (stdout when omitted)
    #[arg(long = "file", short = 'f')]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExecArgs {
    /// Command name (see `kioskly commands`)
    pub name: String,

    /// Command parameter as key=value (repeatable)
    #[arg(long = "param", short = 'P', value_name = "KEY=VALUE")]
    pub params: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Watch every configured device instead of just the selected one
    #[arg(long, short = 'a')]
    pub all: bool,

    /// Override the polling interval in seconds
    #[arg(long, short = 'i', value_name = "SECS")]
    pub interval: Option<u64>,
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
    /// Print the config file location
    Path,

    /// Display the current resolved configuration (secrets masked)
    Show,

    /// List configured devices
    Devices,

    /// Add or replace a device profile after checking the connection
    Add {
        /// Profile name
        name: String,

        /// Device base URL, e.g. http://tablet.local:2323
        #[arg(long)]
        url: String,

        /// API key, stored in the system keyring
        #[arg(long = "key")]
        key: Option<String>,

        /// Save without contacting the device
        #[arg(long)]
        no_check: bool,

        /// Make this the default device
        #[arg(long)]
        default: bool,
    },

    /// Store a device API key in the system keyring
    SetKey {
        /// Device profile name
        device: String,

        /// API key (read from stdin when omitted)
        #[arg(long)]
        key: Option<String>,
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
