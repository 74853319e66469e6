// ── Runtime device configuration ──
//
// These types describe *which* device to talk to and how. They carry
// credential data and polling cadence, but never touch disk: the CLI
// (via kioskly-config) constructs a `DeviceConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;

use kioskly_api::{KioskClient, TlsMode, TransportConfig, normalize_base_url};

use crate::error::CoreError;

/// Default status polling cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// One configured device. Identity is the normalized base URL.
#[derive(Debug, Clone)]
pub struct DeviceRecord {
    base_url: String,
    api_key: Option<SecretString>,
}

impl DeviceRecord {
    pub fn new(base_url: &str, api_key: Option<SecretString>) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            api_key,
        }
    }

    /// Stable identity used by entry lookups.
    pub fn id(&self) -> &str {
        &self.base_url
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&SecretString> {
        self.api_key.as_ref()
    }
}

/// Everything needed to build a client and coordinator for one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub record: DeviceRecord,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// Periodic poll cadence. Zero disables the periodic task; on-demand
    /// refreshes still run.
    pub poll_interval: Duration,
}

impl DeviceConfig {
    pub fn new(record: DeviceRecord) -> Self {
        Self {
            record,
            tls: TlsMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Build the transport client for this device.
    pub fn build_client(&self) -> Result<KioskClient, CoreError> {
        let transport = TransportConfig::new(self.tls.clone());
        Ok(KioskClient::new(
            self.record.base_url(),
            self.record.api_key(),
            &transport,
        )?)
    }
}
