//! End-to-end orchestrator scenarios through the driver

mod common;

use common::{config_for, fast_settings, MockBackends};
use opsdesk::abstractions::{BackendClient, HttpClassifier, HttpStepExecutor};
use opsdesk::catalog::{StepGroup, StepId, TaskSummary};
use opsdesk::error::ErrorCode;
use opsdesk::runbook::{
    Action, Console, Driver, ExecutionOutcome, Gate, NoticeLevel, Phase, StepStatus,
};
use opsdesk::testing::{unknown_classification, RunbookBuilder};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn id(task: &str, group: StepGroup, index: usize) -> StepId {
    StepId::derive(task, group, index)
}

#[tokio::test]
async fn test_auto_precheck_runs_and_manual_successor_waits() {
    let backends = MockBackends::new();
    backends
        .classifier
        .add_result(
            RunbookBuilder::new("free_disk")
                .precheck("A", true)
                .precheck("B", false)
                .build(),
        )
        .await;

    let mut driver = backends.driver();
    driver
        .perform(Action::SubmitQuery {
            query: "free disk on web-3".into(),
        })
        .unwrap();
    driver.run_until_idle().await;

    assert_eq!(backends.executor.called_steps().await, vec![1]);
    let a = id("free_disk", StepGroup::Prechecks, 0);
    let b = id("free_disk", StepGroup::Prechecks, 1);
    let console = driver.console();
    assert_eq!(console.store().status_of(&a), StepStatus::Completed);
    assert_eq!(console.gate(&b).unwrap(), Gate::NeedsApproval);
    assert_eq!(
        console.store().status_of(&b),
        StepStatus::ApprovalRequired
    );
}

#[tokio::test]
async fn test_procedure_failure_blocks_rest_and_postchecks() {
    let backends = MockBackends::new();
    backends
        .classifier
        .add_result(
            RunbookBuilder::new("rotate")
                .procedure("X", true)
                .procedure("Y", true)
                .postcheck("verify", true)
                .build(),
        )
        .await;
    backends
        .executor
        .add_outcome(1, ExecutionOutcome::failure("certificate store locked"))
        .await;

    let mut driver = backends.driver();
    driver
        .perform(Action::SubmitQuery {
            query: "rotate certs".into(),
        })
        .unwrap();
    driver.run_until_idle().await;
    // No prechecks, so nothing was seeded; the operator starts X.
    assert!(backends.executor.get_calls().await.is_empty());

    let x = id("rotate", StepGroup::Procedure, 0);
    driver.perform(Action::RunStep { step_id: x.clone() }).unwrap();
    driver.run_until_idle().await;

    let y = id("rotate", StepGroup::Procedure, 1);
    let post = id("rotate", StepGroup::Postchecks, 0);
    let console = driver.console();
    assert_eq!(console.gate(&y).unwrap(), Gate::Blocked { cause: x.clone() });
    assert_eq!(console.gate(&post).unwrap(), Gate::Blocked { cause: x });
    assert_eq!(backends.executor.called_steps().await, vec![1]);

    let err = driver.perform(Action::RunStep { step_id: y }).unwrap_err();
    assert_eq!(err.code(), ErrorCode::STEP_BLOCKED);

    let warnings: Vec<_> = driver
        .take_notices()
        .into_iter()
        .filter(|n| n.level == NoticeLevel::Warning)
        .collect();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message.contains("certificate store locked"));
}

#[tokio::test]
async fn test_rejecting_a_gated_step_never_calls_the_executor() {
    let backends = MockBackends::new();
    backends
        .classifier
        .add_result(
            RunbookBuilder::new("drop_cache")
                .precheck("flush", false)
                .build(),
        )
        .await;

    let mut driver = backends.driver();
    driver
        .perform(Action::SubmitQuery {
            query: "drop the cache".into(),
        })
        .unwrap();
    driver.run_until_idle().await;

    let flush = id("drop_cache", StepGroup::Prechecks, 0);
    driver
        .perform(Action::RejectStep {
            step_id: flush.clone(),
        })
        .unwrap();
    driver.run_until_idle().await;

    assert!(backends.executor.get_calls().await.is_empty());
    assert_eq!(
        driver.console().store().status_of(&flush),
        StepStatus::Cancelled
    );
    let err = driver
        .perform(Action::ApproveStep { step_id: flush })
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::STEP_ALREADY_ATTEMPTED);
}

#[tokio::test]
async fn test_double_submission_is_refused_locally() {
    let backends = MockBackends::new();
    backends
        .classifier
        .add_result(RunbookBuilder::new("t").procedure("slow", true).build())
        .await;

    let mut driver = backends.driver();
    driver
        .perform(Action::SubmitQuery { query: "go".into() })
        .unwrap();
    driver.run_until_idle().await;

    let slow = id("t", StepGroup::Procedure, 0);
    driver.perform(Action::RunStep { step_id: slow.clone() }).unwrap();
    let err = driver
        .perform(Action::RunStep { step_id: slow.clone() })
        .unwrap_err();
    assert!(err.is_double_submission());
    assert_eq!(driver.pending(), 1);
    assert_eq!(driver.console().executing_steps(), vec![slow]);

    driver.run_until_idle().await;
    assert_eq!(backends.executor.called_steps().await, vec![1]);
}

#[tokio::test]
async fn test_unknown_task_then_explicit_choice_proceeds() {
    let backends = MockBackends::new();
    backends
        .classifier
        .set_tasks(vec![TaskSummary {
            task_id: "restart_pod".into(),
            task_name: "Restart pod".into(),
            description: None,
        }])
        .await;
    backends.classifier.add_result(unknown_classification()).await;
    backends
        .classifier
        .add_result(
            RunbookBuilder::new("restart_pod")
                .precheck("find pod", true)
                .build(),
        )
        .await;

    let mut driver = backends.driver();
    driver.load_tasks().await.unwrap();
    driver
        .perform(Action::SubmitQuery {
            query: "the payments thing is stuck".into(),
        })
        .unwrap();
    driver.run_until_idle().await;

    assert_eq!(driver.console().phase(), Phase::AwaitingTaskChoice);
    assert!(driver.console().board().is_empty());
    assert!(backends.executor.get_calls().await.is_empty());

    let err = driver
        .perform(Action::SelectTask {
            task_id: "not_a_task".into(),
        })
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CLASSIFICATION_UNKNOWN_TASK);

    driver
        .perform(Action::SelectTask {
            task_id: "restart_pod".into(),
        })
        .unwrap();
    driver.run_until_idle().await;

    let requests = backends.classifier.get_requests().await;
    assert_eq!(requests[1].task_id.as_deref(), Some("restart_pod"));
    assert_eq!(requests[1].query, "the payments thing is stuck");
    assert_eq!(driver.console().phase(), Phase::Ready);
    assert_eq!(backends.executor.called_steps().await, vec![1]);
}

#[tokio::test]
async fn test_new_query_discards_previous_runbook() {
    let backends = MockBackends::new();
    backends
        .classifier
        .add_result(RunbookBuilder::new("first").precheck("a", true).build())
        .await;
    backends
        .classifier
        .add_result(RunbookBuilder::new("second").procedure("b", false).build())
        .await;

    let mut driver = backends.driver();
    driver
        .perform(Action::SubmitQuery { query: "one".into() })
        .unwrap();
    driver.run_until_idle().await;
    assert_eq!(driver.console().summary().completed, 1);

    driver
        .perform(Action::SubmitQuery { query: "two".into() })
        .unwrap();
    driver.run_until_idle().await;

    let console = driver.console();
    assert_eq!(console.catalog().unwrap().task_id(), "second");
    assert!(console.store().is_empty());
    assert_eq!(console.generation(), 2);
}

#[tokio::test]
async fn test_http_backends_store_extracted_result_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "tasks": [] })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            RunbookBuilder::new("free_disk")
                .entity("host", Some("web-3"))
                .precheck("free space", true)
                .to_json(),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/execute-step"))
        .and(body_partial_json(json!({
            "taskId": "free_disk",
            "stepNumber": 1,
            "entities": { "host": "web-3" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "disk freed" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server.uri());
    let client = BackendClient::new(&config).unwrap();
    let mut driver = Driver::new(
        Console::new(fast_settings()),
        Arc::new(HttpClassifier::new(client.clone())),
        Arc::new(HttpStepExecutor::new(client)),
    );
    driver.load_tasks().await.unwrap();
    driver
        .perform(Action::SubmitQuery {
            query: "free disk on web-3".into(),
        })
        .unwrap();
    driver.run_until_idle().await;

    let step = id("free_disk", StepGroup::Prechecks, 0);
    let execution = driver.console().execution(&step).unwrap();
    assert_eq!(execution.status(), StepStatus::Completed);
    assert_eq!(execution.result_message(), Some("disk freed"));
    assert_eq!(execution.status_code(), Some(200));
}
