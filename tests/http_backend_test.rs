//! HTTP adapters against a local mock backend

mod common;

use common::config_for;
use opsdesk::abstractions::http::{IDEMPOTENCY_HEADER, USER_ID_HEADER};
use opsdesk::abstractions::{
    BackendClient, HttpClassifier, HttpStepExecutor, StepExecutor, TaskClassifier,
};
use opsdesk::catalog::wire::ExecuteStepRequest;
use opsdesk::catalog::StepGroup;
use opsdesk::error::ErrorCode;
use opsdesk::runbook::{Console, ExecutionOutcome, SessionSettings};
use opsdesk::testing::RunbookBuilder;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn execute_request() -> ExecuteStepRequest {
    let mut entities = BTreeMap::new();
    entities.insert("host".to_string(), Some("web-1".to_string()));
    entities.insert("path".to_string(), None);
    ExecuteStepRequest {
        task_id: "free_disk".to_string(),
        step_number: 2,
        entities,
    }
}

#[tokio::test]
async fn test_classify_posts_request_and_decodes_runbook() {
    let server = MockServer::start().await;
    let runbook = RunbookBuilder::new("free_disk")
        .entity("host", Some("web-1"))
        .precheck("check usage", true)
        .procedure("delete logs", false);
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(header(USER_ID_HEADER, "ops-tester"))
        .and(header_exists(IDEMPOTENCY_HEADER))
        .and(body_partial_json(json!({
            "query": "free disk on web-1",
            "userId": "ops-tester",
            "environment": "staging",
            "context": { "requestedBy": "ops-tester", "priority": "normal" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(runbook.to_json()))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let classifier = HttpClassifier::new(BackendClient::new(&config).unwrap());
    let request = Console::new(SessionSettings::from_config(&config))
        .classify_request("free disk on web-1", None);
    let result = classifier.classify(&request).await.unwrap();

    assert_eq!(result.task_id, "free_disk");
    let catalog = result.catalog().unwrap();
    assert_eq!(catalog.steps(StepGroup::Prechecks).len(), 1);
    assert!(!catalog.steps(StepGroup::Procedure)[0].auto_executable);
    assert_eq!(
        result.extracted_entities.get("host"),
        Some(&Some("web-1".to_string()))
    );

    let received = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body.get("taskId").is_none());
}

#[tokio::test]
async fn test_bearer_token_is_sent_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.api.auth_token = Some("s3cret".to_string());
    let classifier = HttpClassifier::new(BackendClient::new(&config).unwrap());
    assert!(classifier.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_list_accepts_bare_and_wrapped_forms() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "taskId": "free_disk", "taskName": "Free disk" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [
                { "taskId": "restart_pod", "taskName": "Restart pod", "description": "Bounce one pod" },
                { "taskId": "free_disk", "taskName": "Free disk" }
            ]
        })))
        .mount(&server)
        .await;

    let bare = config_for(&format!("{}/api", server.uri()));
    let tasks = HttpClassifier::new(BackendClient::new(&bare).unwrap())
        .list_tasks()
        .await
        .unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].task_id, "free_disk");

    let wrapped = config_for(&format!("{}/v2", server.uri()));
    let tasks = HttpClassifier::new(BackendClient::new(&wrapped).unwrap())
        .list_tasks()
        .await
        .unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].description.as_deref(), Some("Bounce one pod"));
}

#[tokio::test]
async fn test_malformed_task_list_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": 3 })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::new(BackendClient::new(&config_for(&server.uri())).unwrap());
    let err = classifier.list_tasks().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TRANSPORT_DECODE);
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_classify_server_error_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let classifier = HttpClassifier::new(BackendClient::new(&config).unwrap());
    let request = Console::new(SessionSettings::from_config(&config)).classify_request("x", None);
    let err = classifier.classify(&request).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::TRANSPORT_HTTP_STATUS);
    assert_eq!(err.http_status(), Some(503));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_malformed_classification_is_classification_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "confidence": 0.4 })))
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let classifier = HttpClassifier::new(BackendClient::new(&config).unwrap());
    let request = Console::new(SessionSettings::from_config(&config)).classify_request("x", None);
    let err = classifier.classify(&request).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::CLASSIFICATION_MALFORMED);
}

#[tokio::test]
async fn test_execute_step_success_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute-step"))
        .and(header_exists(IDEMPOTENCY_HEADER))
        .and(body_partial_json(json!({
            "taskId": "free_disk",
            "stepNumber": 2,
            "entities": { "host": "web-1", "path": null }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "responseBody": "{\"message\":\"disk freed\"}",
            "statusCode": 200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let executor = HttpStepExecutor::new(BackendClient::new(&config_for(&server.uri())).unwrap());
    let outcome = executor.execute(&execute_request()).await;
    assert_eq!(outcome, ExecutionOutcome::success("disk freed", Some(200)));
}

#[tokio::test]
async fn test_execute_step_logical_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute-step"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errorMessage": "permission denied on /var/log",
            "statusCode": 403
        })))
        .mount(&server)
        .await;

    let executor = HttpStepExecutor::new(BackendClient::new(&config_for(&server.uri())).unwrap());
    let outcome = executor.execute(&execute_request()).await;
    assert_eq!(
        outcome,
        ExecutionOutcome::Failure {
            error_message: "permission denied on /var/log".to_string(),
            status_code: Some(403),
        }
    );
}

#[tokio::test]
async fn test_execute_step_http_error_becomes_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/execute-step"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .mount(&server)
        .await;

    let executor = HttpStepExecutor::new(BackendClient::new(&config_for(&server.uri())).unwrap());
    let outcome = executor.execute(&execute_request()).await;
    assert_eq!(
        outcome,
        ExecutionOutcome::Failure {
            error_message: "HTTP 500: internal error".to_string(),
            status_code: Some(500),
        }
    );
}

#[tokio::test]
async fn test_execute_step_unreachable_backend_becomes_failure() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let executor = HttpStepExecutor::new(BackendClient::new(&config_for(&uri)).unwrap());
    let outcome = executor.execute(&execute_request()).await;
    assert!(!outcome.is_success());
}
