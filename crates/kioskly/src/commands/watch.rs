//! `kioskly watch`: run coordinators and report state changes until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use kioskly_core::{CoordinatorState, DeviceEntry, DeviceHub, FailureKind};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::config::{self, Config, SelectedDevice};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct WatchEvent {
    device: String,
    at: DateTime<Utc>,
    state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl WatchEvent {
    /// `None` for transitions not worth reporting (idle, fetching).
    fn from_state(device: &str, state: &CoordinatorState) -> Option<Self> {
        let (state, at, message) = match state {
            CoordinatorState::Idle | CoordinatorState::Fetching => return None,
            CoordinatorState::Updated { at } => ("updated", *at, None),
            CoordinatorState::Failed {
                kind: FailureKind::Recoverable,
                message,
                at,
            } => ("unavailable", *at, Some(message.clone())),
            CoordinatorState::Failed {
                kind: FailureKind::ReauthRequired,
                message,
                at,
            } => ("reauth_required", *at, Some(message.clone())),
        };
        Some(Self {
            device: device.to_owned(),
            at,
            state,
            message,
        })
    }

    fn to_line(&self, color: bool) -> String {
        let at = self.at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let state = match (color, self.state) {
            (false, s) => s.to_owned(),
            (true, s @ "updated") => s.green().to_string(),
            (true, s @ "unavailable") => s.yellow().to_string(),
            (true, s) => s.red().bold().to_string(),
        };
        match &self.message {
            Some(message) => format!("{at}  {}  {state}: {message}", self.device),
            None => format!("{at}  {}  {state}", self.device),
        }
    }
}

fn render_event(event: &WatchEvent, format: OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        // One document per line so the stream stays parseable.
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(event).map_err(|e| CliError::Render(e.to_string()))
        }
        OutputFormat::Yaml => output::render_single(format, event, |_| String::new()),
        OutputFormat::Table | OutputFormat::Plain => Ok(event.to_line(color)),
    }
}

/// Forward every reportable state change of `entry` into `tx`.
async fn forward_states(name: String, entry: Arc<DeviceEntry>, tx: mpsc::Sender<WatchEvent>) {
    let mut rx = entry.coordinator().subscribe();
    loop {
        let event = WatchEvent::from_state(&name, &rx.borrow_and_update());
        if let Some(event) = event {
            if tx.send(event).await.is_err() {
                return;
            }
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

pub async fn handle(args: WatchArgs, global: &GlobalOpts, cfg: &Config) -> Result<(), CliError> {
    let mut devices: Vec<SelectedDevice> = if args.all {
        config::all_devices(global, cfg)?
    } else {
        vec![config::select_device(global, cfg)?]
    };
    if let Some(secs) = args.interval {
        for device in &mut devices {
            device.config.poll_interval = Duration::from_secs(secs);
        }
    }

    let mut hub = DeviceHub::new();
    let mut named = Vec::with_capacity(devices.len());
    for device in &devices {
        named.push((device.name.clone(), hub.add(&device.config)?));
    }
    let hub = Arc::new(hub);

    let format = config::output_format(global, cfg);
    let color = output::should_color(global.color);
    let (tx, mut rx) = mpsc::channel(64);
    let mut forwarders = JoinSet::new();
    for (name, entry) in &named {
        forwarders.spawn(forward_states(name.clone(), Arc::clone(entry), tx.clone()));
    }
    drop(tx);

    // A device whose first refresh fails keeps polling; its failure reaches
    // the output through the forwarded state stream.
    hub.start_all().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("interrupted, stopping coordinators");
                break;
            }
            event = rx.recv() => match event {
                Some(event) => {
                    output::print_output(&render_event(&event, format, color)?, global.quiet);
                }
                None => break,
            },
        }
    }

    forwarders.abort_all();
    hub.shutdown_all().await;
    Ok(())
}
