use thiserror::Error;

/// Top-level error type for the `kioskly-api` crate.
///
/// Every request failure is classified into exactly one of two kinds:
/// [`Authentication`](Self::Authentication) when the device rejects the
/// credentials, and [`Communication`](Self::Communication) for everything
/// else that went wrong on the wire. The remaining variants are raised
/// while building a client, never by a request.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The device answered 401 or 403.
    #[error("Authentication rejected by device (HTTP {status})")]
    Authentication { status: u16 },

    // ── Communication ───────────────────────────────────────────────
    /// Network, DNS, timeout, unexpected status, or undecodable body.
    #[error("Communication with {url} failed: {cause}")]
    Communication {
        url: String,
        #[source]
        cause: CommunicationCause,
    },

    // ── Construction ────────────────────────────────────────────────
    /// The configured base URL does not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API key cannot be sent as an HTTP header value.
    #[error("Invalid API key header value")]
    InvalidApiKey,

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),
}

/// The underlying reason for a [`Error::Communication`].
#[derive(Debug, Error)]
pub enum CommunicationCause {
    /// The fixed per-request timeout elapsed.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Connection refused, DNS failure, reset, etc.
    #[error("HTTP transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// A non-2xx status other than 401/403.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    /// A 2xx response whose body is not the expected JSON object.
    #[error("invalid response body: {message}")]
    Decode { message: String },

    /// A well-formed response that reports failure (e.g. health `success: false`).
    #[error("unexpected response: {message}")]
    Unexpected { message: String },
}

impl Error {
    /// Returns `true` if the device rejected the credentials.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` for recoverable wire-level failures.
    pub fn is_communication(&self) -> bool {
        matches!(self, Self::Communication { .. })
    }

    /// Returns `true` if the request was cut off by the timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Communication {
                cause: CommunicationCause::Timeout { .. },
                ..
            }
        )
    }

    /// The HTTP status that triggered this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Authentication { status }
            | Self::Communication {
                cause: CommunicationCause::Status { status },
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
