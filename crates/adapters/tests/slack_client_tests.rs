//! HTTP-level tests for the Slack Web API client and hook.
//!
//! Every test runs against a local mock server; nothing reaches slack.com.

#![cfg(feature = "slack")]

use serde_json::{json, Map, Value};
use taskhooks_adapters::{
    Connection, Credential, HookError, MemoryConnectionStore, SlackApiClient, SlackSettings,
    SlackTransport, SlackWebApiHook,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer) -> SlackSettings {
    SlackSettings {
        base_url: server.uri(),
        timeout_secs: 5,
    }
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_post_message_sends_bearer_token_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-test"))
        .and(body_partial_json(json!({"channel": "C123", "text": "hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "channel": "C123",
            "ts": "1700000000.000100"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SlackApiClient::new(Credential::new("xoxb-test").unwrap(), &settings(&server)).unwrap();
    let hook = SlackWebApiHook::with_transport(std::sync::Arc::new(client));
    let resp = hook.post_message("C123", Some("hello"), None).await.unwrap();

    assert!(resp.ok);
    assert_eq!(resp.get_str("ts"), Some("1700000000.000100"));
}

#[tokio::test]
async fn test_not_ok_envelope_surfaces_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"ok": false, "error": "channel_not_found"})),
        )
        .mount(&server)
        .await;

    let client = SlackApiClient::new(Credential::new("xoxb-test").unwrap(), &settings(&server)).unwrap();
    let hook = SlackWebApiHook::with_transport(std::sync::Arc::new(client));
    let err = hook.post_message("C404", Some("hi"), None).await.unwrap_err();

    assert!(matches!(err, HookError::Api { service: "Slack", .. }));
    assert!(err.to_string().contains("channel_not_found"));
}

#[tokio::test]
async fn test_non_json_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth.test"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let client = SlackApiClient::new(Credential::new("xoxb-test").unwrap(), &settings(&server)).unwrap();
    let err = client.call("auth.test", Map::new()).await.unwrap_err();

    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn test_files_upload_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/files.upload"))
        .and(header("authorization", "Bearer xoxb-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "file": {"id": "F1"}})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("report.csv");
    std::fs::write(&file, "a,b\n1,2\n").unwrap();

    let client = SlackApiClient::new(Credential::new("xoxb-test").unwrap(), &settings(&server)).unwrap();
    let hook = SlackWebApiHook::with_transport(std::sync::Arc::new(client));
    hook.post_file(&file, "C9", Some("Daily report"), Some("see attached"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));

    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"channels\""));
    assert!(body.contains("C9"));
    assert!(body.contains("name=\"initial_comment\""));
    assert!(body.contains("filename=\"report.csv\""));
    assert!(body.contains("a,b\n1,2\n"));
}

#[tokio::test]
async fn test_raw_call_forwards_arbitrary_params() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reactions.add"))
        .and(body_partial_json(json!({"name": "thumbsup", "timestamp": "1.2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = SlackApiClient::new(Credential::new("xoxb-test").unwrap(), &settings(&server)).unwrap();
    let hook = SlackWebApiHook::with_transport(std::sync::Arc::new(client));

    let mut params = Map::new();
    params.insert("channel".to_string(), Value::from("C1"));
    params.insert("name".to_string(), Value::from("thumbsup"));
    params.insert("timestamp".to_string(), Value::from("1.2"));
    hook.call("reactions.add", params).await.unwrap();
}

// ============================================================================
// Hook construction
// ============================================================================

#[tokio::test]
async fn test_hook_uses_connection_password_as_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-from-conn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryConnectionStore::new().with(
        "slack_default",
        Connection::new("slack_default").with_password("xoxb-from-conn"),
    );
    let hook = SlackWebApiHook::new(None, Some("slack_default"), &store, &settings(&server))
        .await
        .unwrap();
    hook.post_message("C1", Some("from connection"), None).await.unwrap();
}

#[tokio::test]
async fn test_explicit_token_beats_connection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .and(header("authorization", "Bearer xoxb-explicit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryConnectionStore::new().with(
        "slack_default",
        Connection::new("slack_default").with_password("xoxb-from-conn"),
    );
    let hook = SlackWebApiHook::new(Some("xoxb-explicit"), Some("slack_default"), &store, &settings(&server))
        .await
        .unwrap();
    hook.post_message("C1", Some("explicit"), None).await.unwrap();
}

#[tokio::test]
async fn test_unknown_connection_is_reported() {
    let store = MemoryConnectionStore::new();
    let err = SlackWebApiHook::new(None, Some("nope"), &store, &SlackSettings::default())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, HookError::ConnectionNotFound(ref id) if id == "nope"));
}
