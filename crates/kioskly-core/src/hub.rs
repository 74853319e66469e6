// ── Device hub ──
//
// Owns every configured device: its record, client, and coordinator. The
// set of devices is fixed once configuration has been loaded. A device is
// active once it is polling and has answered at least one status fetch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tracing::{info, warn};

use kioskly_api::{KioskClient, normalize_base_url};

use crate::config::{DeviceConfig, DeviceRecord};
use crate::coordinator::Coordinator;
use crate::error::CoreError;

/// One configured device.
pub struct DeviceEntry {
    record: DeviceRecord,
    coordinator: Coordinator,
    started: AtomicBool,
}

impl DeviceEntry {
    pub fn id(&self) -> &str {
        self.record.id()
    }

    pub fn record(&self) -> &DeviceRecord {
        &self.record
    }

    pub fn client(&self) -> &KioskClient {
        self.coordinator.client()
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Whether the device is polling and has answered at least once.
    pub fn is_active(&self) -> bool {
        self.started.load(Ordering::Acquire) && self.coordinator.data().is_some()
    }

    /// Run the first refresh and start polling.
    ///
    /// Polling starts even when the first refresh fails; the device turns
    /// active on its first successful poll.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.started.store(true, Ordering::Release);
        self.coordinator.start().await?;
        info!(device = self.id(), "device active");
        Ok(())
    }

    pub async fn shutdown(&self) {
        self.started.store(false, Ordering::Release);
        self.coordinator.shutdown().await;
    }
}

impl std::fmt::Debug for DeviceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceEntry")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Registry of configured devices, and the entry resolver over them.
#[derive(Debug, Default)]
pub struct DeviceHub {
    entries: Vec<Arc<DeviceEntry>>,
}

impl DeviceHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the client and coordinator for `config` and add the device.
    ///
    /// Fails when another device already has the same identity.
    pub fn add(&mut self, config: &DeviceConfig) -> Result<Arc<DeviceEntry>, CoreError> {
        if self.get(config.record.id()).is_some() {
            return Err(CoreError::Config {
                message: format!("device {} is configured twice", config.record.id()),
            });
        }

        let client = config.build_client()?;
        let entry = Arc::new(DeviceEntry {
            record: config.record.clone(),
            coordinator: Coordinator::new(client, config.poll_interval),
            started: AtomicBool::new(false),
        });
        self.entries.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Exact lookup by identity.
    pub fn get(&self, id: &str) -> Option<&Arc<DeviceEntry>> {
        self.entries.iter().find(|e| e.id() == id)
    }

    pub fn entries(&self) -> &[Arc<DeviceEntry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Map caller-supplied identifiers to a configured device.
    ///
    /// `entry_id` wins when given and is matched verbatim. Otherwise
    /// `device_url` is normalized and the first device with that base URL
    /// is returned. Empty strings count as absent.
    pub fn resolve(
        &self,
        entry_id: Option<&str>,
        device_url: Option<&str>,
    ) -> Option<&Arc<DeviceEntry>> {
        let entry_id = entry_id.filter(|s| !s.is_empty());
        let device_url = device_url.filter(|s| !s.is_empty());

        if let Some(id) = entry_id {
            return self.get(id);
        }
        let url = normalize_base_url(device_url?);
        self.entries.iter().find(|e| e.record.base_url() == url)
    }

    /// Start every device concurrently. A device whose first refresh fails
    /// keeps polling and stays inactive until it answers; its error is
    /// returned alongside its identity.
    pub async fn start_all(&self) -> Vec<(String, Result<(), CoreError>)> {
        let results = join_all(self.entries.iter().map(|e| e.start())).await;
        self.entries
            .iter()
            .zip(results)
            .map(|(entry, result)| {
                if let Err(e) = &result {
                    warn!(device = entry.id(), error = %e, "first refresh failed, retrying on next poll");
                }
                (entry.id().to_owned(), result)
            })
            .collect()
    }

    pub async fn shutdown_all(&self) {
        join_all(self.entries.iter().map(|e| e.shutdown())).await;
    }
}
