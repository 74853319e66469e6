//! Config subcommand handlers.

use std::io::BufRead;

use secrecy::SecretString;
use serde::Serialize;
use tabled::Tabled;

use kioskly_core::{CoreError, DeviceConfig, DeviceRecord, TlsMode};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, DeviceProfile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Serialize config as TOML with plaintext keys masked.
fn format_config_redacted(mut cfg: Config) -> Result<String, CliError> {
    for profile in cfg.devices.values_mut() {
        if profile.api_key.is_some() {
            profile.api_key = Some("****".into());
        }
    }
    toml::to_string_pretty(&cfg).map_err(|e| CliError::Render(e.to_string()))
}

#[derive(Debug, Serialize)]
struct DeviceInfo {
    name: String,
    url: String,
    default: bool,
    credentials: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "URL")]
    url: String,
    #[tabled(rename = "Default")]
    default: &'static str,
    #[tabled(rename = "Credentials")]
    credentials: String,
}

impl From<&DeviceInfo> for DeviceRow {
    fn from(d: &DeviceInfo) -> Self {
        Self {
            name: d.name.clone(),
            url: d.url.clone(),
            default: if d.default { "*" } else { "" },
            credentials: d.credentials.clone(),
        }
    }
}

/// Where the key for `profile` would come from, without touching the keyring.
fn credential_source(profile: &DeviceProfile) -> String {
    match (&profile.api_key_env, &profile.api_key) {
        (Some(var), _) => format!("env ${var}"),
        (None, Some(_)) => "config file".into(),
        (None, None) => "keyring or none".into(),
    }
}

fn read_key_from_stdin() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let key = line.trim().to_owned();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "key".into(),
            reason: "no API key given on stdin".into(),
        });
    }
    Ok(key)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            output::print_output(&format_config_redacted(cfg)?, global.quiet);
            Ok(())
        }

        ConfigCommand::Devices => {
            let cfg = config::load_config()?;
            let default = cfg.default_device_name().map(str::to_owned);
            let devices: Vec<DeviceInfo> = cfg
                .devices
                .iter()
                .map(|(name, profile)| DeviceInfo {
                    name: name.clone(),
                    url: profile.url.clone(),
                    default: default.as_deref() == Some(name.as_str()),
                    credentials: credential_source(profile),
                })
                .collect();
            let out = output::render_list(
                config::output_format(global, &cfg),
                &devices,
                |d| DeviceRow::from(d),
                |d| d.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Add {
            name,
            url,
            key,
            no_check,
            default,
        } => add_device(global, name, url, key, no_check, default).await,

        ConfigCommand::SetKey { device, key } => {
            let cfg = config::load_config()?;
            cfg.device(&device)?;
            let key = match key {
                Some(key) => key,
                None => read_key_from_stdin()?,
            };
            kioskly_config::store_api_key(&device, &key)?;
            if !global.quiet {
                eprintln!("Stored API key for '{device}' in the system keyring");
            }
            Ok(())
        }
    }
}

async fn add_device(
    global: &GlobalOpts,
    name: String,
    url: String,
    key: Option<String>,
    no_check: bool,
    make_default: bool,
) -> Result<(), CliError> {
    let mut cfg = config::load_config()?;

    // Reject bad or duplicate entries before the network or the keyring.
    if cfg.devices.contains_key(&name) {
        return Err(CliError::InvalidConfig {
            message: format!("device '{name}' already exists"),
        });
    }
    let profile = DeviceProfile {
        url: url.clone(),
        insecure: global.insecure.then_some(true),
        ..DeviceProfile::default()
    };
    cfg.devices.insert(name.clone(), profile);
    if make_default || cfg.default_device.is_none() {
        cfg.default_device = Some(name.clone());
    }
    cfg.validate()?;

    if no_check {
        tracing::debug!(device = %name, "skipping connection check");
    } else {
        let tls = if global.insecure {
            TlsMode::DangerAcceptInvalid
        } else {
            TlsMode::System
        };
        let record = DeviceRecord::new(&url, key.clone().map(SecretString::from));
        let client = DeviceConfig::new(record).with_tls(tls).build_client()?;
        client.check_connection().await.map_err(CoreError::from)?;
    }

    if let Some(key) = key {
        if let Err(e) = kioskly_config::store_api_key(&name, &key) {
            tracing::warn!(device = %name, error = %e, "keyring unavailable, storing key in config file");
            if let Some(profile) = cfg.devices.get_mut(&name) {
                profile.api_key = Some(key);
            }
        }
    }
    config::save_config(&cfg)?;

    if !global.quiet {
        eprintln!("Added device '{name}' to {}", config::config_path().display());
    }
    Ok(())
}
