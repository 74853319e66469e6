//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a distinct exit code per failure kind.

use miette::Diagnostic;
use thiserror::Error;

use kioskly_config::ConfigError;
use kioskly_core::{CoreError, ErrorKind};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const TARGET_UNAVAILABLE: i32 = 6;
    pub const COMMUNICATION: i32 = 7;
    pub const CONFIG: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Communication ────────────────────────────────────────────────
    #[error("Could not talk to the device")]
    #[diagnostic(
        code(kioskly::communication),
        help(
            "Check that the kiosk app is running, its REST API is enabled,\n\
             and the URL is reachable from this machine."
        )
    )]
    Communication {
        #[source]
        source: CoreError,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("The device rejected the API key")]
    #[diagnostic(
        code(kioskly::auth_failed),
        help(
            "Verify the API key configured in the kiosk app.\n\
             Pass it with --api-key, set api_key_env in the device profile,\n\
             or run: kioskly config set-key <device>"
        )
    )]
    AuthFailed {
        #[source]
        source: CoreError,
    },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Unknown command '{name}'")]
    #[diagnostic(code(kioskly::not_found), help("Run: kioskly commands"))]
    UnknownCommand { name: String },

    #[error("Invalid input: {message}")]
    #[diagnostic(
        code(kioskly::invalid_input),
        help("Run: kioskly commands to see accepted parameters")
    )]
    InvalidInput { message: String },

    #[error("Target unavailable: {reason}")]
    #[diagnostic(code(kioskly::target_unavailable))]
    TargetUnavailable { reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(kioskly::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Device '{name}' not found in configuration")]
    #[diagnostic(
        code(kioskly::device_not_found),
        help("Available devices: {available}")
    )]
    DeviceNotFound { name: String, available: String },

    #[error("No device selected")]
    #[diagnostic(
        code(kioskly::no_device),
        help(
            "Pass --url, pick a profile with --device, or set default_device in\n\
             {path}"
        )
    )]
    NoDevice { path: String },

    #[error(transparent)]
    #[diagnostic(code(kioskly::config))]
    Config(ConfigError),

    #[error("Configuration error: {message}")]
    #[diagnostic(code(kioskly::config))]
    InvalidConfig { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Communication { .. } => exit_code::COMMUNICATION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::UnknownCommand { .. } => exit_code::NOT_FOUND,
            Self::InvalidInput { .. } | Self::Validation { .. } => exit_code::USAGE,
            Self::TargetUnavailable { .. } => exit_code::TARGET_UNAVAILABLE,
            Self::DeviceNotFound { .. }
            | Self::NoDevice { .. }
            | Self::Config(_)
            | Self::InvalidConfig { .. } => exit_code::CONFIG,
            Self::Io(_) | Self::Render(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err.kind() {
            ErrorKind::Authentication => return Self::AuthFailed { source: err },
            ErrorKind::Communication => return Self::Communication { source: err },
            _ => {}
        }
        match err {
            CoreError::NotFound { name } => Self::UnknownCommand { name },
            CoreError::InvalidInput { message } => Self::InvalidInput { message },
            CoreError::TargetUnavailable { reason } => Self::TargetUnavailable { reason },
            other => Self::InvalidConfig {
                message: other.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownDevice { name } => Self::DeviceNotFound {
                name,
                available: "(see kioskly config devices)".into(),
            },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_keep_their_exit_codes() {
        let auth = CliError::from(CoreError::from(kioskly_core::ApiError::Authentication {
            status: 401,
        }));
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let comm = CliError::from(CoreError::from(kioskly_core::ApiError::Communication {
            url: "http://h/api/status".into(),
            cause: kioskly_core::CommunicationCause::Status { status: 500 },
        }));
        assert_eq!(comm.exit_code(), exit_code::COMMUNICATION);
    }

    #[test]
    fn dispatch_errors_map_to_distinct_codes() {
        let codes = [
            CliError::from(CoreError::NotFound { name: "x".into() }).exit_code(),
            CliError::from(CoreError::InvalidInput {
                message: "value: out of range".into(),
            })
            .exit_code(),
            CliError::from(CoreError::TargetUnavailable {
                reason: "inactive".into(),
            })
            .exit_code(),
        ];
        assert_eq!(
            codes,
            [exit_code::NOT_FOUND, exit_code::USAGE, exit_code::TARGET_UNAVAILABLE]
        );
    }

    #[test]
    fn config_errors_use_config_code() {
        let err = CliError::from(ConfigError::NoDevices);
        assert_eq!(err.exit_code(), exit_code::CONFIG);
    }
}
