// ── Core error types ──
//
// Transport failures pass through unchanged inside `Api`; the dispatcher
// and coordinator add their own kinds on top. `kind()` collapses all of
// them onto the taxonomy consumers branch on.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Dispatch errors ──────────────────────────────────────────────
    #[error("Unknown command: {name}")]
    NotFound { name: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Target unavailable: {reason}")]
    TargetUnavailable { reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Transport errors (kind preserved) ────────────────────────────
    #[error(transparent)]
    Api(#[from] kioskly_api::Error),
}

/// The distinguishing kind of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Communication,
    NotFound,
    InvalidInput,
    TargetUnavailable,
    Configuration,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::TargetUnavailable { .. } => ErrorKind::TargetUnavailable,
            Self::Api(kioskly_api::Error::Authentication { .. }) => ErrorKind::Authentication,
            Self::Api(kioskly_api::Error::Communication { .. }) => ErrorKind::Communication,
            Self::Config { .. } | Self::Api(_) => ErrorKind::Configuration,
        }
    }

    pub(crate) fn invalid_input(field: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: format!("{field}: {reason}"),
        }
    }

    pub(crate) fn target_unavailable(reason: impl Into<String>) -> Self {
        Self::TargetUnavailable {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_kinds_are_preserved() {
        let auth = CoreError::from(kioskly_api::Error::Authentication { status: 403 });
        assert_eq!(auth.kind(), ErrorKind::Authentication);

        let comm = CoreError::from(kioskly_api::Error::Communication {
            url: "http://h/api/status".into(),
            cause: kioskly_api::CommunicationCause::Status { status: 502 },
        });
        assert_eq!(comm.kind(), ErrorKind::Communication);
        assert!(comm.to_string().contains("502"));
    }

    #[test]
    fn construction_errors_are_configuration() {
        let err = CoreError::from(kioskly_api::Error::InvalidApiKey);
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::TargetUnavailable.to_string(), "target_unavailable");
    }
}
