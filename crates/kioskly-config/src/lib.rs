//! Configuration for kioskly.
//!
//! TOML device profiles, API key resolution (env + keyring + plaintext),
//! and translation to `kioskly_core::DeviceConfig`. The CLI layers its
//! flag overrides on top of this.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use kioskly_core::{DeviceConfig, DeviceRecord, TlsMode};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "KIOSKLY_CONFIG";

const KEYRING_SERVICE: &str = "kioskly";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in the configuration")]
    UnknownDevice { name: String },

    #[error("no devices configured")]
    NoDevices,

    #[error("devices '{first}' and '{second}' both point at {url}")]
    DuplicateDevice {
        first: String,
        second: String,
        url: String,
    },

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
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Device used when `--device` is not given.
    pub default_device: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceProfile>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            poll_interval_secs: default_poll_interval(),
            insecure: false,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_poll_interval() -> u64 {
    kioskly_core::DEFAULT_POLL_INTERVAL.as_secs()
}

/// A named device profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Device base URL (e.g., "http://192.168.1.50:8080").
    pub url: String,

    /// API key (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Override the polling interval. Zero disables periodic polling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_interval_secs: Option<u64>,

    /// Override insecure TLS setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Path to custom CA certificate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

impl Config {
    /// Look up a device profile by name.
    pub fn device(&self, name: &str) -> Result<&DeviceProfile, ConfigError> {
        self.devices.get(name).ok_or_else(|| ConfigError::UnknownDevice {
            name: name.to_owned(),
        })
    }

    /// Name of the device to use when none is given explicitly: the
    /// configured default, else the only device.
    pub fn default_device_name(&self) -> Option<&str> {
        if let Some(name) = self.default_device.as_deref() {
            return Some(name);
        }
        match self.devices.keys().collect::<Vec<_>>().as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    /// Check every device URL parses and that no two devices share an
    /// identity (normalized base URL).
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen: HashMap<String, &str> = HashMap::new();
        for (name, profile) in &self.devices {
            parse_url(&profile.url, name)?;
            let id = DeviceRecord::new(&profile.url, None).id().to_owned();
            if let Some(first) = seen.get(id.as_str()) {
                return Err(ConfigError::DuplicateDevice {
                    first: (*first).to_owned(),
                    second: name.clone(),
                    url: id,
                });
            }
            seen.insert(id, name.as_str());
        }
        if let Some(default) = &self.default_device {
            if !self.devices.is_empty() {
                self.device(default)?;
            }
        }
        Ok(())
    }

    /// Translate every profile into a runtime `DeviceConfig`.
    pub fn device_configs(&self) -> Result<Vec<(String, DeviceConfig)>, ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        self.validate()?;
        self.devices
            .iter()
            .map(|(name, profile)| {
                profile_to_device_config(profile, name, &self.defaults)
                    .map(|config| (name.clone(), config))
            })
            .collect()
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$KIOSKLY_CONFIG`, else the platform
/// config directory.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("dev", "kioskly", "kioskly").map_or_else(
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
    p.push("kioskly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` layered over defaults, then `KIOSKLY_` env vars
/// (`__` separates nesting, e.g. `KIOSKLY_DEFAULTS__OUTPUT=json`).
///
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("KIOSKLY_").split("__"));

    let config: Config = figment.extract()?;
    config.validate()?;
    Ok(config)
}

/// Parse a TOML document over the defaults, without env layering.
pub fn parse_config(toml_src: &str) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_src))
        .extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring entry name holding a device's API key.
pub fn keyring_user(device_name: &str) -> String {
    format!("{device_name}/api-key")
}

/// Resolve an API key from the credential chain.
///
/// `api_key_env` → system keyring → plaintext. Devices without an API key
/// are valid, so the chain ending empty yields `None`. Empty values are
/// skipped.
pub fn resolve_api_key(profile: &DeviceProfile, device_name: &str) -> Option<SecretString> {
    // 1. Profile's api_key_env → env var lookup
    if let Some(val) = profile
        .api_key_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
    {
        return Some(SecretString::from(val));
    }

    // 2. System keyring
    if let Some(secret) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(device_name))
        .and_then(|entry| entry.get_password())
        .ok()
        .filter(|s| !s.is_empty())
    {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    profile
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .map(SecretString::from)
}

/// Store an API key in the system keyring for `device_name`.
pub fn store_api_key(device_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(device_name))
        .and_then(|entry| entry.set_password(key))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

/// TLS mode for a profile: `insecure` wins, then a custom CA, else the
/// system roots.
pub fn profile_tls(profile: &DeviceProfile, defaults: &Defaults) -> TlsMode {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    }
}

/// Build a `DeviceConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_device_config(
    profile: &DeviceProfile,
    device_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    parse_url(&profile.url, device_name)?;

    let record = DeviceRecord::new(&profile.url, resolve_api_key(profile, device_name));
    let poll_interval = Duration::from_secs(
        profile
            .poll_interval_secs
            .unwrap_or(defaults.poll_interval_secs),
    );

    Ok(DeviceConfig::new(record)
        .with_tls(profile_tls(profile, defaults))
        .with_poll_interval(poll_interval))
}

fn parse_url(raw: &str, device_name: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: format!("devices.{device_name}.url"),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: format!("devices.{device_name}.url"),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}
