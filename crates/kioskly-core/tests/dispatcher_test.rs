#![allow(clippy::unwrap_used)]
// Command dispatch end to end: validation, target resolution, transport
// error propagation, and the follow-up coordinator refresh.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kioskly_core::{
    CommandCall, CommandDispatcher, CommandRegistry, DeviceConfig, DeviceHub, DeviceRecord,
    ErrorKind, Target,
};

// ── Helpers ─────────────────────────────────────────────────────────

struct Harness {
    server: MockServer,
    dispatcher: CommandDispatcher,
}

impl Harness {
    async fn count(&self, verb: &str, route: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == route)
            .count()
    }

    async fn total_requests(&self) -> usize {
        self.server.received_requests().await.unwrap().len()
    }

    fn url(&self) -> String {
        self.server.uri()
    }
}

async fn harness_with_delay(active: bool, status_delay: Duration) -> Harness {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "success": true, "data": {} }))
                .set_delay(status_delay),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    let mut hub = DeviceHub::new();
    let config = DeviceConfig::new(DeviceRecord::new(&server.uri(), None))
        .with_poll_interval(Duration::ZERO);
    let entry = hub.add(&config).unwrap();
    if active {
        entry.start().await.unwrap();
    }

    let dispatcher = CommandDispatcher::new(Arc::new(hub), Arc::new(CommandRegistry::new()));
    Harness { server, dispatcher }
}

async fn harness(active: bool) -> Harness {
    harness_with_delay(active, Duration::ZERO).await
}

async fn mount_post(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "success": true })))
        .mount(server)
        .await;
}

// ── Validation ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_out_of_range_brightness_makes_no_request() {
    let h = harness(true).await;
    mount_post(&h.server, "/api/brightness", 200).await;
    let before = h.total_requests().await;

    let call = CommandCall::new(Target::url(h.url())).param("value", 150);
    let err = h.dispatcher.execute("set_brightness", call).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(h.total_requests().await, before);
}

#[tokio::test]
async fn test_unknown_command_is_not_found() {
    let h = harness(true).await;
    let before = h.total_requests().await;

    let err = h
        .dispatcher
        .execute("self_destruct", CommandCall::new(Target::url(h.url())))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(h.total_requests().await, before);
}

#[tokio::test]
async fn test_dispatcher_registers_builtins() {
    let h = harness(false).await;
    assert!(h.dispatcher.registry().is_registered());
    assert!(h.dispatcher.registry().get("remote_command").is_some());
}

// ── Target resolution ───────────────────────────────────────────────

#[tokio::test]
async fn test_missing_target_is_unavailable() {
    let h = harness(true).await;
    let before = h.total_requests().await;

    let err = h
        .dispatcher
        .execute("reload", CommandCall::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetUnavailable);

    let err = h
        .dispatcher
        .execute("reload", CommandCall::new(Target::url("http://elsewhere:9")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetUnavailable);

    let err = h
        .dispatcher
        .execute("reload", CommandCall::new(Target::entry("nope")))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetUnavailable);

    assert_eq!(h.total_requests().await, before);
}

#[tokio::test]
async fn test_inactive_device_is_unavailable() {
    let h = harness(false).await;
    mount_post(&h.server, "/api/reload", 200).await;

    let err = h
        .dispatcher
        .execute("reload", CommandCall::new(Target::url(h.url())))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TargetUnavailable);
    assert_eq!(h.total_requests().await, 0);
}

#[tokio::test]
async fn test_entry_id_target() {
    let h = harness(true).await;
    mount_post(&h.server, "/api/wake", 200).await;

    let id = h.dispatcher.hub().entries()[0].id().to_owned();
    h.dispatcher
        .execute("wake", CommandCall::new(Target::entry(id)))
        .await
        .unwrap();

    assert_eq!(h.count("POST", "/api/wake").await, 1);
}

// ── Dispatch ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_remote_command_posts_once_then_refreshes_once() {
    let h = harness(true).await;
    mount_post(&h.server, "/api/remote/up", 200).await;
    assert_eq!(h.count("GET", "/api/status").await, 1);

    // Trailing slash resolves to the same device.
    let call = CommandCall::new(Target::url(format!("{}/", h.url()))).param("command", "up");
    h.dispatcher.execute("remote_command", call).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.count("POST", "/api/remote/up").await, 1);
    assert_eq!(h.count("GET", "/api/status").await, 2);
}

#[tokio::test]
async fn test_no_content_reply_still_refreshes() {
    let h = harness(true).await;
    Mock::given(method("POST"))
        .and(path("/api/reload"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let call = CommandCall::new(Target::url(h.url()));
    h.dispatcher.execute("reload", call).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.count("GET", "/api/status").await, 2);
}

#[tokio::test]
async fn test_device_turns_available_once_polling_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "data": {} })),
        )
        .mount(&server)
        .await;
    mount_post(&server, "/api/reload", 200).await;

    let mut hub = DeviceHub::new();
    let config = DeviceConfig::new(DeviceRecord::new(&server.uri(), None))
        .with_poll_interval(Duration::from_millis(50));
    let entry = hub.add(&config).unwrap();
    assert!(entry.start().await.is_err());

    let dispatcher = CommandDispatcher::new(Arc::new(hub), Arc::new(CommandRegistry::new()));
    let call = CommandCall::new(Target::url(server.uri()));
    let err = dispatcher.execute("reload", call.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TargetUnavailable);

    tokio::time::sleep(Duration::from_millis(400)).await;
    dispatcher.execute("reload", call).await.unwrap();
    dispatcher.hub().shutdown_all().await;
}

#[tokio::test]
async fn test_payload_is_validated_and_coerced() {
    let h = harness(true).await;
    Mock::given(method("POST"))
        .and(path("/api/brightness"))
        .and(body_json(json!({ "value": 42 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&h.server)
        .await;

    let call = CommandCall::new(Target::url(h.url())).param("value", "42");
    h.dispatcher.execute("set_brightness", call).await.unwrap();
}

#[tokio::test]
async fn test_transport_errors_propagate_without_refresh() {
    let h = harness(true).await;
    mount_post(&h.server, "/api/reboot", 401).await;
    mount_post(&h.server, "/api/reload", 502).await;

    let call = CommandCall::new(Target::url(h.url()));
    let err = h.dispatcher.execute("reboot", call.clone()).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    let err = h.dispatcher.execute("reload", call).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Communication);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.count("GET", "/api/status").await, 1);
}

#[tokio::test]
async fn test_back_to_back_commands_coalesce_refreshes() {
    let h = harness_with_delay(true, Duration::from_millis(250)).await;
    mount_post(&h.server, "/api/screen/on", 200).await;

    let call = CommandCall::new(Target::url(h.url()));
    h.dispatcher.execute("screen_on", call.clone()).await.unwrap();
    h.dispatcher.execute("screen_on", call).await.unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let extra = h.count("GET", "/api/status").await - 1;
    assert!((1..=2).contains(&extra), "extra fetches: {extra}");
}
