//! End-to-end tests through the HTTP delivery channel.
//!
//! Uses wiremock to stand in for the telemetry backend and verifies the
//! wire shape of delivered records, bearer credential handling, and that
//! a failing backend never surfaces to the wrapped call's caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use tokenmeter::{
    BufferSink, DeliveryChannel, DiagnosticSink, HttpDelivery, Metadata, TelemetryRecord,
    TokenUsage, Tracker, TrackerConfig, DURATION_KEY,
};

async fn requests_received(server: &MockServer, count: usize) -> Vec<Request> {
    // Delivery is detached from the caller path, so poll until the
    // backend has seen the expected number of requests.
    for _ in 0..100 {
        let requests = server.received_requests().await.unwrap_or_default();
        if requests.len() >= count {
            return requests;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("backend never received {} request(s)", count);
}

#[tokio::test]
async fn http_delivery_posts_record_with_bearer_credential() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(header("authorization", "Bearer tok-123"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let record = TelemetryRecord::new(
        "chat_completion",
        TokenUsage::new(10, 5),
        Some("m1".to_string()),
        Metadata::new(),
        120,
    );

    let channel = HttpDelivery::new();
    let destination = format!("{}/events", server.uri());
    channel
        .send(&destination, &record, Some("tok-123"))
        .await
        .expect("delivery should succeed");

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["functionName"], "chat_completion");
    assert_eq!(body["inputTokens"], 10);
    assert_eq!(body["outputTokens"], 5);
    assert_eq!(body["totalTokens"], 15);
    assert_eq!(body["modelName"], "m1");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["metadata"][DURATION_KEY], 120);
}

#[tokio::test]
async fn http_delivery_reports_non_success_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let record = TelemetryRecord::new(
        "chat",
        TokenUsage::default(),
        None,
        Metadata::new(),
        1,
    );

    let channel = HttpDelivery::new();
    let error = channel
        .send(&server.uri(), &record, None)
        .await
        .expect_err("non-2xx must be reported");

    let message = error.to_string();
    assert!(message.contains("503"), "unexpected error: {}", message);
    assert!(message.contains("overloaded"), "unexpected error: {}", message);
}

#[tokio::test]
async fn tracked_call_delivers_record_to_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    // This path runs the default LogSink; route its diagnostics through
    // the test logger so they are visible on failure.
    let _ = env_logger::builder().is_test(true).try_init();

    let config = TrackerConfig::new("chat", format!("{}/events", server.uri()))
        .with_metadata_entry("env", "test");
    let tracker = Tracker::new(config);

    let result: Result<Value, String> = tracker
        .call(|| async {
            Ok(json!({
                "usage": { "prompt_tokens": 10, "completion_tokens": 5 },
                "model": "m1",
                "choices": [{ "message": { "content": "hello" } }]
            }))
        })
        .await;

    // The caller's value passes through untouched
    let value = result.unwrap();
    assert_eq!(value["choices"][0]["message"]["content"], "hello");

    let requests = requests_received(&server, 1).await;
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["functionName"], "chat");
    assert_eq!(body["totalTokens"], 15);
    assert_eq!(body["modelName"], "m1");
    assert_eq!(body["metadata"]["env"], "test");
    assert!(body["metadata"][DURATION_KEY].is_number());
}

#[tokio::test]
async fn failing_backend_never_surfaces_to_caller() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = Arc::new(BufferSink::new());
    let config = TrackerConfig::new("chat", server.uri());
    let tracker = Tracker::with_channels(
        config,
        Arc::new(HttpDelivery::new()),
        Arc::clone(&sink) as Arc<dyn DiagnosticSink>,
    );

    let result: Result<Value, String> = tracker
        .call(|| async {
            Ok(json!({ "usage": { "prompt_tokens": 1, "completion_tokens": 1 } }))
        })
        .await;

    assert!(result.is_ok());

    // The failure lands in diagnostics only
    requests_received(&server, 1).await;
    for _ in 0..100 {
        if !sink.errors().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].contains("delivery"));
}
