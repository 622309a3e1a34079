//! Wire formats exchanged with the classification and execution backends
//!
//! Only the four-group payload shape is accepted. Earlier flat step lists
//! fail to decode and surface as malformed classifications.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Free-form context sent alongside a classification request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub reason: String,
    pub priority: String,
    pub requested_by: String,
    pub timestamp: String,
}

/// Body of `POST /classify`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    pub query: String,
    pub user_id: String,
    pub environment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub context: RequestContext,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStep {
    #[serde(default)]
    pub step_number: Option<u32>,
    #[serde(default, alias = "stepName")]
    pub description: String,
    #[serde(default, alias = "httpMethod")]
    pub method: Option<String>,
    #[serde(default, alias = "apiEndpoint")]
    pub path: Option<String>,
    #[serde(default)]
    pub auto_executable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireStepGroups {
    #[serde(default)]
    pub prechecks: Vec<WireStep>,
    #[serde(default)]
    pub procedure: Vec<WireStep>,
    #[serde(default)]
    pub postchecks: Vec<WireStep>,
    #[serde(default)]
    pub rollback: Vec<WireStep>,
}

/// Body returned by `POST /classify`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireClassification {
    pub task_id: String,
    #[serde(default)]
    pub task_name: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub extracted_entities: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub step_groups: Option<WireStepGroups>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTask {
    pub task_id: String,
    pub task_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /tasks` answers either with a bare list or wrapped in `{ "tasks": [...] }`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WireTaskList {
    Bare(Vec<WireTask>),
    Wrapped { tasks: Vec<WireTask> },
}

impl WireTaskList {
    pub fn into_tasks(self) -> Vec<WireTask> {
        match self {
            WireTaskList::Bare(tasks) | WireTaskList::Wrapped { tasks } => tasks,
        }
    }
}

/// Body of `POST /execute-step`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStepRequest {
    pub task_id: String,
    pub step_number: u32,
    pub entities: BTreeMap<String, Option<String>>,
}

/// Body returned by `POST /execute-step`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteStepResponse {
    pub success: bool,
    #[serde(default)]
    pub response_body: Option<String>,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ExecuteStepResponse {
    /// Read an envelope from a decoded object without failing on field types
    ///
    /// Returns `None` unless `success` is a boolean. Non-string
    /// `responseBody` and `errorMessage` values are kept as their JSON text.
    pub fn from_object(object: &Map<String, Value>) -> Option<Self> {
        let success = object.get("success")?.as_bool()?;
        Some(Self {
            success,
            response_body: lenient_text(object.get("responseBody")),
            status_code: object
                .get("statusCode")
                .and_then(Value::as_u64)
                .and_then(|code| u16::try_from(code).ok()),
            error_message: lenient_text(object.get("errorMessage")),
        })
    }
}

fn lenient_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
