// Kiosk device HTTP client
//
// Wraps `reqwest::Client` with base URL joining, API key injection, and
// status classification. Every call either decodes its body or fails with
// one of the two request error kinds; nothing is retried here.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::endpoint::{self, API_KEY_HEADER};
use crate::error::{CommunicationCause, Error};
use crate::transport::{REQUEST_TIMEOUT, TransportConfig};

/// One decoded JSON document returned by the device.
///
/// Opaque to this crate: the shape is whatever the device sends, as long
/// as the top level is an object.
pub type Snapshot = serde_json::Map<String, Value>;

/// Async client for a single kiosk device.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct KioskClient {
    http: reqwest::Client,
    base_url: String,
}

impl KioskClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `base_url`, sending `api_key` as `X-Api-Key`
    /// on every request when present and non-empty.
    pub fn new(
        base_url: &str,
        api_key: Option<&SecretString>,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key.filter(|k| !k.expose_secret().is_empty()) {
            let mut value =
                HeaderValue::from_str(key.expose_secret()).map_err(|_| Error::InvalidApiKey)?;
            value.set_sensitive(true);
            headers.insert(API_KEY_HEADER, value);
        }

        let http = transport.build_client_with_headers(headers)?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = endpoint::normalize_base_url(base_url);
        Url::parse(&base_url)?;
        Ok(Self { http, base_url })
    }

    /// The normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Fetch the full `/api/status` document.
    pub async fn get_status(&self) -> Result<Snapshot, Error> {
        self.request_json(Method::GET, endpoint::STATUS, None, false).await
    }

    /// Fetch the `/api/health` document.
    pub async fn get_health(&self) -> Result<Snapshot, Error> {
        self.request_json(Method::GET, endpoint::HEALTH, None, false).await
    }

    /// Fetch the current screenshot image.
    pub async fn get_screenshot(&self) -> Result<Bytes, Error> {
        self.get_binary(endpoint::SCREENSHOT).await
    }

    /// GET `path` and return the raw body.
    pub async fn get_binary(&self, path: &str) -> Result<Bytes, Error> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.send(self.http.get(&url), &url).await?;
        resp.bytes().await.map_err(|e| transport_error(&url, e))
    }

    /// POST a command, with `payload` as the JSON body when given.
    ///
    /// An empty 2xx body (such as `204 No Content`) yields an empty snapshot.
    pub async fn post_command(
        &self,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<Snapshot, Error> {
        self.request_json(Method::POST, endpoint, payload, true).await
    }

    /// Validate that the device is reachable and accepts our credentials.
    ///
    /// Succeeds only when `/api/health` answers with `success: true`.
    pub async fn check_connection(&self) -> Result<Snapshot, Error> {
        let health = self.get_health().await?;
        if health.get("success") == Some(&Value::Bool(true)) {
            Ok(health)
        } else {
            debug!(?health, "health check did not report success");
            Err(Error::Communication {
                url: self.url(endpoint::HEALTH),
                cause: CommunicationCause::Unexpected {
                    message: "health check did not report success".into(),
                },
            })
        }
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn request_json(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
        accept_empty: bool,
    ) -> Result<Snapshot, Error> {
        let url = self.url(endpoint);
        debug!("{method} {url}");

        let mut builder = self.http.request(method, &url);
        if let Some(body) = payload {
            builder = builder.json(body);
        }

        let resp = self.send(builder, &url).await?;
        let body = resp.text().await.map_err(|e| transport_error(&url, e))?;
        if accept_empty && body.trim().is_empty() {
            return Ok(Snapshot::new());
        }

        serde_json::from_str::<Snapshot>(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Communication {
                url,
                cause: CommunicationCause::Decode {
                    message: format!("{e} (body preview: {preview:?})"),
                },
            }
        })
    }

    /// Send the request and classify the response status.
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, Error> {
        let resp = builder.send().await.map_err(|e| transport_error(url, e))?;
        let status = resp.status();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(status = status.as_u16(), url, "device rejected credentials");
            return Err(Error::Authentication {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            return Err(Error::Communication {
                url: url.to_owned(),
                cause: CommunicationCause::Status {
                    status: status.as_u16(),
                },
            });
        }

        Ok(resp)
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> Error {
    let cause = if err.is_timeout() {
        CommunicationCause::Timeout {
            timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    } else {
        CommunicationCause::Transport(err)
    };
    Error::Communication {
        url: url.to_owned(),
        cause,
    }
}
