// ── Status coordinator ──
//
// One per device. A single background task owns every fetch: periodic
// ticks and on-demand refresh requests both funnel into it, so two fetches
// for the same device never overlap. The merged snapshot is published
// through an `ArcSwapOption`; readers never block and never see a partial
// snapshot.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use kioskly_api::{KioskClient, Snapshot};

use crate::error::CoreError;

// ── State ────────────────────────────────────────────────────────

/// How a failed poll should be surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Communication failure; last good data is still served.
    Recoverable,
    /// Credentials were rejected; the user has to fix them.
    ReauthRequired,
}

/// Coordinator lifecycle, observable through [`Coordinator::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CoordinatorState {
    Idle,
    Fetching,
    Updated {
        at: DateTime<Utc>,
    },
    Failed {
        kind: FailureKind,
        message: String,
        at: DateTime<Utc>,
    },
}

// ── Coordinator ──────────────────────────────────────────────────

/// Per-device polling state machine.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    client: KioskClient,
    poll_interval: Duration,
    data: ArcSwapOption<Snapshot>,
    state: watch::Sender<CoordinatorState>,
    /// Holds at most one stored permit, which is what coalesces requests
    /// made while a fetch is running into a single follow-up fetch.
    refresh: Notify,
    /// Serializes fetches between the poll task and direct `refresh()` calls.
    fetch_lock: Mutex<()>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator. Does NOT fetch or spawn anything;
    /// call [`start()`](Self::start) for that.
    pub fn new(client: KioskClient, poll_interval: Duration) -> Self {
        let (state, _) = watch::channel(CoordinatorState::Idle);
        Self {
            inner: Arc::new(CoordinatorInner {
                client,
                poll_interval,
                data: ArcSwapOption::empty(),
                state,
                refresh: Notify::new(),
                fetch_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        }
    }

    pub fn client(&self) -> &KioskClient {
        &self.inner.client
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    // ── Readers ──────────────────────────────────────────────────

    /// The latest merged snapshot, or `None` before the first success.
    pub fn data(&self) -> Option<Arc<Snapshot>> {
        self.inner.data.load_full()
    }

    /// Current state (cloned).
    pub fn state(&self) -> CoordinatorState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.inner.state.subscribe()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Perform the first refresh, then spawn the polling task.
    ///
    /// The task is spawned even when the first refresh fails, so a device
    /// that is offline or rejecting credentials is picked up again by a
    /// later tick. The first refresh's error is still returned.
    pub async fn start(&self) -> Result<(), CoreError> {
        let first = self.refresh().await;

        let mut handle = self.inner.task_handle.lock().await;
        if handle.is_none() && !self.inner.cancel.is_cancelled() {
            let coordinator = self.clone();
            let cancel = self.inner.cancel.clone();
            *handle = Some(tokio::spawn(poll_task(coordinator, cancel)));
            info!(
                url = self.inner.client.base_url(),
                interval_secs = self.inner.poll_interval.as_secs(),
                "coordinator started"
            );
        }
        first.map(|_| ())
    }

    /// Stop the polling task and wait for it to exit. Terminal.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task_handle.lock().await.take() {
            let _ = handle.await;
        }
        debug!(url = self.inner.client.base_url(), "coordinator stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.inner
            .task_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Ask the polling task for a fetch without waiting for it.
    ///
    /// Requests made while a fetch is in flight collapse into one extra
    /// fetch. Without a running task the request stays pending until
    /// [`start()`](Self::start).
    pub fn request_refresh(&self) {
        self.inner.refresh.notify_one();
    }

    /// Fetch now and wait for the result.
    ///
    /// On success the merged snapshot replaces the stored one. On failure
    /// the stored snapshot is left untouched and the error is returned.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, CoreError> {
        let _guard = self.inner.fetch_lock.lock().await;
        self.inner.state.send_replace(CoordinatorState::Fetching);

        let client = &self.inner.client;
        let mut status = match client.get_status().await {
            Ok(status) => status,
            Err(e) => {
                let kind = if e.is_authentication() {
                    error!(url = client.base_url(), error = %e, "credentials rejected, re-authentication required");
                    FailureKind::ReauthRequired
                } else {
                    warn!(url = client.base_url(), error = %e, "status poll failed, keeping last data");
                    FailureKind::Recoverable
                };
                self.inner.state.send_replace(CoordinatorState::Failed {
                    kind,
                    message: e.to_string(),
                    at: Utc::now(),
                });
                return Err(e.into());
            }
        };

        match client.get_health().await {
            Ok(health) => merge_health(&mut status, health),
            Err(e) => debug!(error = %e, "health fetch failed, publishing status without it"),
        }

        let snapshot = Arc::new(status);
        self.inner.data.store(Some(Arc::clone(&snapshot)));
        self.inner
            .state
            .send_replace(CoordinatorState::Updated { at: Utc::now() });
        Ok(snapshot)
    }
}

/// Inject a health document under `status.data.health`.
///
/// Uses the health document's own `data` member when it has one, the whole
/// document otherwise. A missing `data` member on the status side is
/// created; a non-object one is left alone.
pub fn merge_health(status: &mut Snapshot, mut health: Snapshot) {
    let health_data = health
        .remove("data")
        .unwrap_or_else(|| Value::Object(health));

    match status
        .entry("data")
        .or_insert_with(|| Value::Object(serde_json::Map::new()))
    {
        Value::Object(data) => {
            data.insert("health".into(), health_data);
        }
        other => debug!(data = ?other, "status data is not an object, skipping health merge"),
    }
}

// ── Background task ──────────────────────────────────────────────

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Fetch on every tick and on every (coalesced) refresh request.
async fn poll_task(coordinator: Coordinator, cancel: CancellationToken) {
    let period = coordinator.inner.poll_interval;
    let mut interval = (!period.is_zero()).then(|| {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = coordinator.inner.refresh.notified() => {
                debug!("refresh requested");
            }
            () = next_tick(&mut interval) => {}
        }

        // Failures are already logged and published as state.
        let _ = coordinator.refresh().await;

        if let Some(interval) = interval.as_mut() {
            interval.reset();
        }
    }
}
