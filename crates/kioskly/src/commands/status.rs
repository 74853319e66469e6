//! `kioskly status`: one coordinator refresh, rendered as extracted values.

use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

use kioskly_core::{Coordinator, Snapshot, extract};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// One extracted value, as serialized for structured output.
#[derive(Debug, Serialize)]
struct ValueEntry {
    key: &'static str,
    name: &'static str,
    value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit: Option<&'static str>,
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&ValueEntry> for ValueRow {
    fn from(e: &ValueEntry) -> Self {
        Self {
            key: e.key,
            name: e.name,
            value: display_value(e),
        }
    }
}

fn display_value(entry: &ValueEntry) -> String {
    let Some(value) = &entry.value else {
        return "-".into();
    };
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "on".into(),
        Value::Bool(false) => "off".into(),
        other => other.to_string(),
    };
    match entry.unit {
        Some(unit) => format!("{text} {unit}"),
        None => text,
    }
}

fn entries(snapshot: &Snapshot) -> Vec<ValueEntry> {
    extract::extract_all(snapshot)
        .into_iter()
        .map(|(extractor, value)| ValueEntry {
            key: extractor.key,
            name: extractor.name,
            value,
            unit: extractor.unit(),
        })
        .collect()
}

pub async fn handle(args: StatusArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let (device, client) = super::connect(global, cfg)?;
    let coordinator = Coordinator::new(client, device.config.poll_interval);
    let snapshot = coordinator.refresh().await?;

    let format = config::output_format(global, cfg);
    let out = if args.raw {
        output::render_single(format, &*snapshot, |s| {
            serde_json::to_string_pretty(s).unwrap_or_default()
        })?
    } else {
        let values = entries(&snapshot);
        output::render_list(format, &values, |e| ValueRow::from(e), |e| {
            format!("{}\t{}", e.key, display_value(e))
        })?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
