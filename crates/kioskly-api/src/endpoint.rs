//! Fixed device endpoints and base URL normalization.

/// Full device status document.
pub const STATUS: &str = "/api/status";

/// Lightweight health document, also used to validate a connection.
pub const HEALTH: &str = "/api/health";

/// Current screen contents as an image.
pub const SCREENSHOT: &str = "/api/screenshot";

/// Header carrying the device API key.
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Strip trailing slashes so `http://h/` and `http://h` share one identity.
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_owned()
}
