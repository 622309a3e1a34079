//! Remote execution client
//!
//! Submits one step to the execution backend and normalizes the reply into
//! an [`ExecutionOutcome`]. Every failure mode, transport included, comes
//! back as `ExecutionOutcome::Failure`; nothing is mutated here.

use super::http::BackendClient;
use crate::catalog::wire::{ExecuteStepRequest, ExecuteStepResponse};
use crate::runbook::execution::ExecutionOutcome;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

const DEFAULT_FAILURE: &str = "Step execution failed";
const MALFORMED_ENVELOPE: &str = "Malformed execute-step reply: `success` is not a boolean";

#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(&self, request: &ExecuteStepRequest) -> ExecutionOutcome;
}

/// Executor backed by `POST /execute-step`
pub struct HttpStepExecutor {
    client: BackendClient,
}

impl HttpStepExecutor {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StepExecutor for HttpStepExecutor {
    async fn execute(&self, request: &ExecuteStepRequest) -> ExecutionOutcome {
        let url = match self.client.api().execute_url() {
            Ok(url) => url,
            Err(e) => return ExecutionOutcome::failure(e.user_message()),
        };
        let raw = match self.client.post_json(url.clone(), request).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, step_number = request.step_number, "Execute-step transport failure");
                return ExecutionOutcome::failure(e.user_message());
            }
        };
        if !raw.is_success() {
            let error_message = match raw.body.trim() {
                "" => format!("HTTP {}", raw.status),
                body => format!("HTTP {}: {}", raw.status, body),
            };
            return ExecutionOutcome::Failure {
                error_message,
                status_code: Some(raw.status),
            };
        }
        normalize_reply(raw.status, &raw.body)
    }
}

/// Normalize a 2xx execute-step body
///
/// Any JSON object carrying a `success` key is an [`ExecuteStepResponse`]
/// envelope and its flag decides the outcome. Every other body is the
/// step's own payload.
pub fn normalize_reply(http_status: u16, body: &str) -> ExecutionOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) if object.contains_key("success") => {
            match ExecuteStepResponse::from_object(&object) {
                Some(envelope) => normalize_envelope(http_status, envelope, body),
                None => {
                    warn!(http_status, "Execute-step reply has a non-boolean success flag");
                    ExecutionOutcome::Failure {
                        error_message: MALFORMED_ENVELOPE.to_string(),
                        status_code: Some(http_status),
                    }
                }
            }
        }
        _ => ExecutionOutcome::success(extract_message(body), Some(http_status)),
    }
}

/// `raw_body` stands in for a missing `responseBody`
pub fn normalize_envelope(
    http_status: u16,
    envelope: ExecuteStepResponse,
    raw_body: &str,
) -> ExecutionOutcome {
    let status_code = envelope.status_code.or(Some(http_status));
    if envelope.success {
        ExecutionOutcome::Success {
            message: extract_message(envelope.response_body.as_deref().unwrap_or(raw_body)),
            status_code,
        }
    } else {
        ExecutionOutcome::Failure {
            error_message: envelope
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FAILURE.to_string()),
            status_code,
        }
    }
}

/// The `message` field of a JSON object body, else the raw body
pub fn extract_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => body.to_string(),
        },
        _ => body.to_string(),
    }
}

/// Scripted executor for tests
///
/// Outcomes are queued per step number; unscripted steps succeed with
/// message `"ok"`.
pub struct MockStepExecutor {
    pub outcomes: Arc<Mutex<HashMap<u32, Vec<ExecutionOutcome>>>>,
    /// Every request `execute` received, in call order
    pub calls: Arc<Mutex<Vec<ExecuteStepRequest>>>,
}

impl MockStepExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_outcome(&self, step_number: u32, outcome: ExecutionOutcome) {
        self.outcomes
            .lock()
            .await
            .entry(step_number)
            .or_default()
            .push(outcome);
    }

    pub async fn get_calls(&self) -> Vec<ExecuteStepRequest> {
        self.calls.lock().await.clone()
    }

    /// Step numbers in call order
    pub async fn called_steps(&self) -> Vec<u32> {
        self.calls
            .lock()
            .await
            .iter()
            .map(|c| c.step_number)
            .collect()
    }
}

impl Default for MockStepExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepExecutor for MockStepExecutor {
    async fn execute(&self, request: &ExecuteStepRequest) -> ExecutionOutcome {
        self.calls.lock().await.push(request.clone());
        let mut outcomes = self.outcomes.lock().await;
        match outcomes.get_mut(&request.step_number) {
            Some(queue) if !queue.is_empty() => queue.remove(0),
            _ => ExecutionOutcome::success("ok", Some(200)),
        }
    }
}
