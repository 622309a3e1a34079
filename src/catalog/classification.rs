//! Classification results and the static task catalog

use super::wire::{WireClassification, WireStep, WireTask};
use super::{Step, StepCatalog, StepGroup, StepGroups};
use crate::error::{ConsoleError, ErrorCode, ErrorExt, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Task id the classifier answers with when it cannot pick a task
pub const UNKNOWN_TASK_ID: &str = "unknown";

/// One entry of the task catalog used for disambiguation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: String,
    pub task_name: String,
    pub description: Option<String>,
}

impl From<WireTask> for TaskSummary {
    fn from(task: WireTask) -> Self {
        Self {
            task_id: task.task_id,
            task_name: task.task_name,
            description: task.description,
        }
    }
}

impl TaskSummary {
    /// Label shown in the disambiguation prompt
    pub fn label(&self) -> String {
        match &self.description {
            Some(d) if !d.trim().is_empty() => format!("{} ({}) - {}", self.task_name, self.task_id, d),
            _ => format!("{} ({})", self.task_name, self.task_id),
        }
    }
}

/// Decoded answer of the classification backend
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub task_id: String,
    pub task_name: String,
    pub confidence: Option<f64>,
    pub service: Option<String>,
    pub extracted_entities: BTreeMap<String, Option<String>>,
    pub warnings: Vec<String>,
    /// Absent when the task is unknown
    pub step_groups: Option<StepGroups>,
}

impl ClassificationResult {
    /// Decode a raw `/classify` body
    pub fn from_json(body: &str) -> Result<Self> {
        let wire: WireClassification = serde_json::from_str(body)
            .to_classification_error("Classification response did not match the expected shape")?;
        Self::from_wire(wire)
    }

    pub fn from_wire(wire: WireClassification) -> Result<Self> {
        if wire.task_id.trim().is_empty() {
            return Err(ConsoleError::classification_with_code(
                ErrorCode::CLASSIFICATION_MALFORMED,
                "Classification response has an empty taskId",
            ));
        }

        let unknown = is_unknown_task(&wire.task_id);
        let step_groups = if unknown {
            None
        } else {
            Some(convert_groups(wire.step_groups.unwrap_or_default()))
        };

        Ok(Self {
            task_name: wire.task_name.unwrap_or_else(|| wire.task_id.clone()),
            task_id: wire.task_id,
            confidence: wire.confidence,
            service: wire.service,
            extracted_entities: wire.extracted_entities,
            warnings: wire.warnings,
            step_groups,
        })
    }

    /// True when the classifier could not choose a task
    pub fn is_unknown(&self) -> bool {
        is_unknown_task(&self.task_id)
    }

    /// Entities that carry a value, for display
    pub fn present_entities(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extracted_entities
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (k.as_str(), v)))
    }

    /// Build the immutable step catalog; `None` for the unknown task
    pub fn catalog(&self) -> Option<StepCatalog> {
        self.step_groups
            .as_ref()
            .map(|groups| StepCatalog::new(&self.task_id, &self.task_name, groups.clone()))
    }
}

pub fn is_unknown_task(task_id: &str) -> bool {
    task_id.trim().eq_ignore_ascii_case(UNKNOWN_TASK_ID)
}

fn convert_groups(wire: super::wire::WireStepGroups) -> StepGroups {
    let mut groups = StepGroups::default();
    for (group, steps) in [
        (StepGroup::Prechecks, wire.prechecks),
        (StepGroup::Procedure, wire.procedure),
        (StepGroup::Postchecks, wire.postchecks),
        (StepGroup::Rollback, wire.rollback),
    ] {
        *groups.get_mut(group) = steps
            .into_iter()
            .enumerate()
            .map(|(index, s)| convert_step(group, index, s))
            .collect();
    }
    groups
}

fn convert_step(group: StepGroup, index: usize, wire: WireStep) -> Step {
    Step {
        group,
        index,
        step_number: wire.step_number.unwrap_or(index as u32 + 1),
        description: wire.description,
        remote_method: wire.method,
        remote_path: wire.path,
        auto_executable: wire.auto_executable,
    }
}
