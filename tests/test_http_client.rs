//! Integration tests for the HTTP orchestrator client
//!
//! Tests the client's contract against a mock server:
//! - 200 with a task body yields the task
//! - 404 means no task is available
//! - any other status, or an unreachable server, is an error
//! - results are posted as JSON and must be acknowledged with 200

use distcalc::calculation::Operator;
use distcalc::error::AgentError;
use distcalc::protocol::{Task, TaskResult};
use distcalc::transport::{HttpOrchestratorClient, OrchestratorClient};
use serde_json::json;
use std::time::Duration;
use url::Url;
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpOrchestratorClient {
    HttpOrchestratorClient::new(
        Url::parse(&server.uri()).unwrap(),
        Duration::from_secs(2),
    )
    .unwrap()
}

#[tokio::test]
async fn test_fetch_task_returns_task_on_ok() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/internal/task"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "numbers": [2.0, 3.0],
            "operators": ["*"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let task = client_for(&mock_server).fetch_task().await.unwrap();

    assert_eq!(
        task,
        Some(Task {
            id,
            numbers: vec![2.0, 3.0],
            operators: vec![Operator::Multiply],
        })
    );
}

#[tokio::test]
async fn test_fetch_task_not_found_means_no_task() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/internal/task"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let task = client_for(&mock_server).fetch_task().await.unwrap();
    assert!(task.is_none());
}

#[tokio::test]
async fn test_fetch_task_server_error_is_unexpected_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/internal/task"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).fetch_task().await.unwrap_err();

    assert!(matches!(err, AgentError::UnexpectedStatus { status: 500 }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_fetch_task_invalid_body_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/internal/task"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).fetch_task().await.unwrap_err();
    assert!(matches!(err, AgentError::Http(_)));
}

#[tokio::test]
async fn test_fetch_task_unreachable_server_is_error() {
    // Bind then drop a server so the port is very likely closed
    let uri = {
        let server = MockServer::start().await;
        server.uri()
    };
    let client =
        HttpOrchestratorClient::new(Url::parse(&uri).unwrap(), Duration::from_millis(500)).unwrap();

    let err = client.fetch_task().await.unwrap_err();
    assert!(matches!(err, AgentError::Http(_)));
}

#[tokio::test]
async fn test_send_result_posts_json() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/internal/result"))
        .and(body_json(json!({ "id": id, "result": 6.0 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .send_result(&TaskResult::success(id, 6.0))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_failure_result_includes_error() {
    let mock_server = MockServer::start().await;
    let id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/internal/result"))
        .and(body_json(json!({ "id": id, "result": 0.0, "error": "division by zero" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    client_for(&mock_server)
        .send_result(&TaskResult::failure(id, "division by zero"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_send_result_requires_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/internal/result"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .send_result(&TaskResult::success(Uuid::new_v4(), 1.0))
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::UnexpectedStatus { status: 400 }));
}

#[tokio::test]
async fn test_base_url_prefix_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/calc/internal/task"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base = Url::parse(&format!("{}/calc/", mock_server.uri())).unwrap();
    let client = HttpOrchestratorClient::new(base, Duration::from_secs(2)).unwrap();

    assert!(client.fetch_task().await.unwrap().is_none());
}
