//! CLI configuration: thin wrapper around `kioskly_config` shared types.
//!
//! Adds device resolution that respects `GlobalOpts` flag overrides
//! (--device, --url, --api-key, --insecure).

use std::time::Duration;

use secrecy::SecretString;

use kioskly_core::{DeviceConfig, DeviceRecord, TlsMode};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use kioskly_config::{Config, DeviceProfile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Output format: flag, else `defaults.output`, else table.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    if let Some(format) = global.output {
        return format;
    }
    <OutputFormat as clap::ValueEnum>::from_str(&config.defaults.output, true)
        .unwrap_or(OutputFormat::Table)
}

/// A device selected for this invocation.
#[derive(Debug)]
pub struct SelectedDevice {
    /// Profile name, or the URL for ad-hoc devices.
    pub name: String,
    pub config: DeviceConfig,
}

/// Resolve the single device this invocation targets.
///
/// Order: an explicit `--device` profile, then `--url` on its own, then
/// the config's default device. Flag overrides apply on top of a profile.
pub fn select_device(global: &GlobalOpts, config: &Config) -> Result<SelectedDevice, CliError> {
    let profile_name = match (&global.device, &global.url) {
        (Some(name), _) => Some(name.as_str()),
        (None, Some(_)) => None,
        (None, None) => config.default_device_name(),
    };

    if let Some(name) = profile_name {
        let profile = config
            .devices
            .get(name)
            .ok_or_else(|| CliError::DeviceNotFound {
                name: name.to_owned(),
                available: available_devices(config),
            })?;
        return Ok(SelectedDevice {
            name: name.to_owned(),
            config: resolve_profile(profile, name, global.url.as_deref(), global, config)?,
        });
    }

    let url = global.url.as_deref().ok_or_else(|| CliError::NoDevice {
        path: config_path().display().to_string(),
    })?;
    Ok(SelectedDevice {
        name: url.to_owned(),
        config: ad_hoc_device(url, global, config)?,
    })
}

/// Every configured device, with global flag overrides applied.
pub fn all_devices(global: &GlobalOpts, config: &Config) -> Result<Vec<SelectedDevice>, CliError> {
    if config.devices.is_empty() {
        return Err(CliError::NoDevice {
            path: config_path().display().to_string(),
        });
    }
    config
        .devices
        .iter()
        .map(|(name, profile)| {
            // --url only overrides a single selected device.
            Ok(SelectedDevice {
                name: name.clone(),
                config: resolve_profile(profile, name, None, global, config)?,
            })
        })
        .collect()
}

/// Translate a profile + global flags into a `DeviceConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &DeviceProfile,
    name: &str,
    url_override: Option<&str>,
    global: &GlobalOpts,
    config: &Config,
) -> Result<DeviceConfig, CliError> {
    let mut device = kioskly_config::profile_to_device_config(profile, name, &config.defaults)?;

    let url = url_override.unwrap_or(&profile.url);
    let api_key = match &global.api_key {
        Some(key) => Some(SecretString::from(key.clone())),
        None => device.record.api_key().cloned(),
    };
    device.record = DeviceRecord::new(&validate_url(url)?, api_key);

    if global.insecure {
        device.tls = TlsMode::DangerAcceptInvalid;
    }
    Ok(device)
}

/// A device given only by `--url` (and optionally `--api-key`).
fn ad_hoc_device(url: &str, global: &GlobalOpts, config: &Config) -> Result<DeviceConfig, CliError> {
    let api_key = global.api_key.clone().map(SecretString::from);
    let tls = if global.insecure || config.defaults.insecure {
        TlsMode::DangerAcceptInvalid
    } else {
        TlsMode::System
    };
    Ok(DeviceConfig::new(DeviceRecord::new(&validate_url(url)?, api_key))
        .with_tls(tls)
        .with_poll_interval(Duration::from_secs(config.defaults.poll_interval_secs)))
}

fn validate_url(raw: &str) -> Result<String, CliError> {
    let parsed = raw
        .parse::<url::Url>()
        .map_err(|_| CliError::Validation {
            field: "url".into(),
            reason: format!("invalid URL: {raw}"),
        })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CliError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", parsed.scheme()),
        });
    }
    Ok(raw.to_owned())
}

fn available_devices(config: &Config) -> String {
    if config.devices.is_empty() {
        return "(none)".into();
    }
    config.devices.keys().cloned().collect::<Vec<_>>().join(", ")
}
