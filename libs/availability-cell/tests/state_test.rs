use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::Value;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use availability_cell::state::AvailabilityState;
use shared_config::AppConfig;
use shared_models::AppError;
use shared_utils::test_utils::{MockBackendResponses, TestConfig, TEST_TOKEN};

const OTHER_TOKEN: &str = "tok_8d2e6b0a4c";

async fn mount_view(server: &MockServer, token: &str, view: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/public/macro-period/{}", token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(view))
        .mount(server)
        .await;
}

fn state_with(server: &MockServer, tune: impl FnOnce(&mut AppConfig)) -> AvailabilityState {
    let mut config = TestConfig::with_backend(&server.uri()).to_app_config();
    tune(&mut config);
    AvailabilityState::new(Arc::new(config))
}

#[tokio::test]
async fn test_concurrent_first_loads_share_one_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/public/macro-period/{}", TEST_TOKEN)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(MockBackendResponses::two_unit_view(vec![]))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    let state = state_with(&mock_server, |_| {});

    let (first, second) = tokio::join!(state.session(TEST_TOKEN), state.session(TEST_TOKEN));

    let first = first.unwrap();
    let second = second.unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(state.session_count().await, 1);
}

#[tokio::test]
async fn test_failed_first_load_leaves_no_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/public/macro-period/{}", TEST_TOKEN)))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockBackendResponses::error_response("Link not found")))
        .mount(&mock_server)
        .await;
    let state = state_with(&mock_server, |_| {});

    let result = state.session(TEST_TOKEN).await;

    assert_matches!(result.err(), Some(AppError::NotFound(_)));
    assert_eq!(state.session_count().await, 0);
}

#[tokio::test]
async fn test_reload_of_expired_link_drops_session() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/public/macro-period/{}", TEST_TOKEN)))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockBackendResponses::two_unit_view(vec![])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/public/macro-period/{}", TEST_TOKEN)))
        .respond_with(ResponseTemplate::new(404).set_body_json(MockBackendResponses::error_response("Link expired")))
        .mount(&mock_server)
        .await;
    let state = state_with(&mock_server, |_| {});

    state.open(TEST_TOKEN).await.unwrap();
    assert_eq!(state.session_count().await, 1);

    assert_matches!(state.open(TEST_TOKEN).await.err(), Some(AppError::NotFound(_)));
    assert_eq!(state.session_count().await, 0);
}

#[tokio::test]
async fn test_registry_cap_evicts_oldest_idle_session() {
    let mock_server = MockServer::start().await;
    mount_view(&mock_server, TEST_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    mount_view(&mock_server, OTHER_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    let state = state_with(&mock_server, |config| config.max_sessions = 1);

    let first = state.session(TEST_TOKEN).await.unwrap();
    drop(first);
    state.session(OTHER_TOKEN).await.unwrap();

    assert_eq!(state.session_count().await, 1);
}

#[tokio::test]
async fn test_registry_cap_keeps_session_in_use() {
    let mock_server = MockServer::start().await;
    mount_view(&mock_server, TEST_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    mount_view(&mock_server, OTHER_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    let state = state_with(&mock_server, |config| config.max_sessions = 1);

    let held = state.session(TEST_TOKEN).await.unwrap();
    let _guard = held.lock().await;
    state.session(OTHER_TOKEN).await.unwrap();

    assert_eq!(state.session_count().await, 2);
}

#[tokio::test]
async fn test_idle_sessions_expire() {
    let mock_server = MockServer::start().await;
    mount_view(&mock_server, TEST_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    mount_view(&mock_server, OTHER_TOKEN, MockBackendResponses::two_unit_view(vec![])).await;
    let state = state_with(&mock_server, |config| config.session_idle_ttl_secs = 0);

    state.session(TEST_TOKEN).await.unwrap();
    state.session(OTHER_TOKEN).await.unwrap();

    assert_eq!(state.session_count().await, 1);
}
