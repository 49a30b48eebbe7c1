use assert_matches::assert_matches;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reqwest::Method;
use shared_backend::{BackendClient, BackendError};
use shared_config::AppConfig;

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        macro_period_api_url: server.uri(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_request_decodes_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/macro-period/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&config_for(&mock_server));
    let value: Value = client
        .request::<Value, ()>(Method::GET, "/public/macro-period/abc", None)
        .await
        .unwrap();

    assert_eq!(value["id"], 7);
}

#[tokio::test]
async fn test_request_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(body_json(json!({"confirm": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&config_for(&mock_server));
    let value: Value = client
        .request(Method::POST, "/echo", Some(&json!({"confirm": false})))
        .await
        .unwrap();

    assert_eq!(value["ok"], true);
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/macro-period/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Invalid or expired link"})))
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&config_for(&mock_server));
    let result = client
        .request::<Value, ()>(Method::GET, "/public/macro-period/missing", None)
        .await;

    let error = result.unwrap_err();
    assert!(error.is_not_found());
    assert_eq!(error.user_message(), "Invalid or expired link");
    assert_matches!(error, BackendError::Api { status: 404, .. });
}

#[tokio::test]
async fn test_undecodable_body_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&config_for(&mock_server));
    let result = client.request::<Value, ()>(Method::GET, "/broken", None).await;

    assert_matches!(result, Err(BackendError::Decode(_)));
}

#[tokio::test]
async fn test_request_bytes_returns_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/calendar")
                .set_body_bytes(b"BEGIN:VCALENDAR".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let client = BackendClient::new(&config_for(&mock_server));
    let (content_type, bytes) = client.request_bytes("/feed").await.unwrap();

    assert_eq!(content_type.as_deref(), Some("text/calendar"));
    assert_eq!(bytes, b"BEGIN:VCALENDAR".to_vec());
}
