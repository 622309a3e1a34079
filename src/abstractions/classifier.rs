//! Classification backend abstraction
//!
//! [`TaskClassifier`] turns a query into a [`ClassificationResult`] and
//! serves the static task catalog used for disambiguation.

use super::http::BackendClient;
use crate::catalog::wire::{ClassifyRequest, WireTaskList};
use crate::catalog::{ClassificationResult, TaskSummary};
use crate::error::{ConsoleError, ErrorExt, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[async_trait]
pub trait TaskClassifier: Send + Sync {
    /// Classify a query, optionally pinned to an explicit task id
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationResult>;

    /// The static task catalog
    async fn list_tasks(&self) -> Result<Vec<TaskSummary>>;
}

/// Classifier backed by `POST /classify` and `GET /tasks`
pub struct HttpClassifier {
    client: BackendClient,
}

impl HttpClassifier {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TaskClassifier for HttpClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationResult> {
        let url = self.client.api().classify_url()?;
        let raw = self
            .client
            .post_json(url.clone(), request)
            .await?
            .error_for_status(&url)?;
        let result = ClassificationResult::from_json(&raw.body)?;
        debug!(task_id = %result.task_id, "Classification received");
        Ok(result)
    }

    async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        let url = self.client.api().tasks_url()?;
        let raw = self.client.get(url.clone()).await?.error_for_status(&url)?;
        let list: WireTaskList = serde_json::from_str(&raw.body)
            .to_decode_error("Task list did not match the expected shape", &url)?;
        Ok(list.into_tasks().into_iter().map(TaskSummary::from).collect())
    }
}

/// Scripted classifier for tests
pub struct MockClassifier {
    /// Answers handed out in order by `classify`
    pub responses: Arc<Mutex<Vec<Result<ClassificationResult>>>>,
    pub tasks: Arc<Mutex<Vec<TaskSummary>>>,
    /// Every request `classify` received
    pub requests: Arc<Mutex<Vec<ClassifyRequest>>>,
}

impl MockClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            tasks: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn add_response(&self, response: Result<ClassificationResult>) {
        self.responses.lock().await.push(response);
    }

    pub async fn add_result(&self, result: ClassificationResult) {
        self.add_response(Ok(result)).await;
    }

    pub async fn set_tasks(&self, tasks: Vec<TaskSummary>) {
        *self.tasks.lock().await = tasks;
    }

    pub async fn get_requests(&self) -> Vec<ClassifyRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TaskClassifier for MockClassifier {
    async fn classify(&self, request: &ClassifyRequest) -> Result<ClassificationResult> {
        self.requests.lock().await.push(request.clone());
        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            return Err(ConsoleError::other("No mock classification configured"));
        }
        responses.remove(0)
    }

    async fn list_tasks(&self) -> Result<Vec<TaskSummary>> {
        Ok(self.tasks.lock().await.clone())
    }
}
