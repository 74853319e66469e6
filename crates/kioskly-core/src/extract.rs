// ── Value extractors ──
//
// Declarative, pure readers over a merged snapshot. Each extractor names
// one displayed value and the path to it under the snapshot's `data`
// mapping. Hosts enumerate the tables below; nothing here does I/O.

use serde_json::Value;

use kioskly_api::Snapshot;

/// How an extracted value is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// A measurement, optionally with a unit.
    Sensor { unit: Option<&'static str> },
    /// An on/off flag. Only a literal JSON `true` reads as on.
    Binary,
    /// Free text.
    Text,
}

/// A stable key plus the path to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueExtractor {
    pub key: &'static str,
    pub name: &'static str,
    pub kind: ValueKind,
    /// Path below `data`.
    pub path: &'static [&'static str],
}

impl ValueExtractor {
    const fn sensor(
        key: &'static str,
        name: &'static str,
        unit: &'static str,
        path: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            name,
            kind: ValueKind::Sensor { unit: Some(unit) },
            path,
        }
    }

    const fn binary(key: &'static str, name: &'static str, path: &'static [&'static str]) -> Self {
        Self {
            key,
            name,
            kind: ValueKind::Binary,
            path,
        }
    }

    const fn text(key: &'static str, name: &'static str, path: &'static [&'static str]) -> Self {
        Self {
            key,
            name,
            kind: ValueKind::Text,
            path,
        }
    }

    /// Read this value from a snapshot.
    ///
    /// Missing segments and JSON `null` yield `None`. Binary extractors
    /// always yield `Some(Bool)`: `true` only for a literal `true`.
    pub fn extract(&self, snapshot: &Snapshot) -> Option<Value> {
        let found = lookup(snapshot, self.path);
        match self.kind {
            ValueKind::Binary => Some(Value::Bool(matches!(found, Some(Value::Bool(true))))),
            ValueKind::Sensor { .. } | ValueKind::Text => found.cloned(),
        }
    }

    pub fn unit(&self) -> Option<&'static str> {
        match self.kind {
            ValueKind::Sensor { unit } => unit,
            ValueKind::Binary | ValueKind::Text => None,
        }
    }
}

/// Walk `path` below the snapshot's `data` mapping.
pub fn lookup<'a>(snapshot: &'a Snapshot, path: &[&str]) -> Option<&'a Value> {
    let mut current = snapshot.get("data")?;
    for segment in path {
        current = current.as_object()?.get(*segment)?;
    }
    (!current.is_null()).then_some(current)
}

pub const SENSORS: &[ValueExtractor] = &[
    ValueExtractor::sensor("battery_level", "Battery Level", "%", &["battery", "level"]),
    ValueExtractor::sensor(
        "battery_temperature",
        "Battery Temperature",
        "°C",
        &["battery", "temperature"],
    ),
    ValueExtractor::sensor("screen_brightness", "Screen Brightness", "%", &["screen", "brightness"]),
    ValueExtractor::sensor("wifi_rssi", "WiFi RSSI", "dBm", &["wifi", "rssi"]),
    ValueExtractor::sensor(
        "storage_available",
        "Storage Available",
        "MB",
        &["storage", "availableMB"],
    ),
    ValueExtractor::sensor("storage_used_percent", "Storage Used", "%", &["storage", "usedPercent"]),
    ValueExtractor::sensor("memory_available", "Memory Available", "MB", &["memory", "availableMB"]),
    ValueExtractor::sensor("memory_used_percent", "Memory Used", "%", &["memory", "usedPercent"]),
    ValueExtractor::sensor("light_level", "Light Level", "lx", &["sensors", "light"]),
    ValueExtractor::sensor("proximity", "Proximity", "cm", &["sensors", "proximity"]),
    ValueExtractor::sensor(
        "auto_brightness_level",
        "Automatic Brightness Level",
        "lx",
        &["autoBrightness", "currentLightLevel"],
    ),
    ValueExtractor::sensor("audio_volume", "Audio Volume", "%", &["audio", "volume"]),
];

pub const BINARY_SENSORS: &[ValueExtractor] = &[
    ValueExtractor::binary("screen_on", "Screen On", &["screen", "on"]),
    ValueExtractor::binary(
        "screensaver_active",
        "Screensaver Active",
        &["screen", "screensaverActive"],
    ),
    ValueExtractor::binary("battery_charging", "Battery Charging", &["battery", "charging"]),
    ValueExtractor::binary("wifi_connected", "WiFi Connected", &["wifi", "connected"]),
    ValueExtractor::binary(
        "autobrightness_enabled",
        "Auto Brightness Enabled",
        &["autoBrightness", "enabled"],
    ),
    ValueExtractor::binary("kiosk_enabled", "Kiosk Mode Enabled", &["kiosk", "enabled"]),
];

pub const TEXTS: &[ValueExtractor] = &[ValueExtractor::text(
    "webview_url",
    "WebView URL",
    &["webview", "currentUrl"],
)];

/// Every extractor, sensors first.
pub fn all() -> impl Iterator<Item = &'static ValueExtractor> {
    SENSORS.iter().chain(BINARY_SENSORS).chain(TEXTS)
}

pub fn find(key: &str) -> Option<&'static ValueExtractor> {
    all().find(|e| e.key == key)
}

/// Evaluate every extractor against `snapshot`.
pub fn extract_all(snapshot: &Snapshot) -> Vec<(&'static ValueExtractor, Option<Value>)> {
    all().map(|e| (e, e.extract(snapshot))).collect()
}
