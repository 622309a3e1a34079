//! Test data builders for runbook scenarios

use crate::catalog::{ClassificationResult, Step, StepCatalog, StepGroup, StepGroups};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Builder for classification results and their step catalogs
///
/// Step numbers are assigned sequentially across the whole runbook in the
/// order steps are added.
pub struct RunbookBuilder {
    task_id: String,
    task_name: String,
    groups: StepGroups,
    entities: BTreeMap<String, Option<String>>,
    warnings: Vec<String>,
    next_number: u32,
}

impl RunbookBuilder {
    pub fn new(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            task_name: task_id.replace('_', " "),
            groups: StepGroups::default(),
            entities: BTreeMap::new(),
            warnings: Vec::new(),
            next_number: 1,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.task_name = name.to_string();
        self
    }

    pub fn step(mut self, group: StepGroup, description: &str, auto_executable: bool) -> Self {
        let steps = self.groups.get_mut(group);
        steps.push(Step {
            group,
            index: steps.len(),
            step_number: self.next_number,
            description: description.to_string(),
            remote_method: Some("POST".to_string()),
            remote_path: Some(format!("/ops/{}/{}", group, self.next_number)),
            auto_executable,
        });
        self.next_number += 1;
        self
    }

    pub fn precheck(self, description: &str, auto_executable: bool) -> Self {
        self.step(StepGroup::Prechecks, description, auto_executable)
    }

    pub fn procedure(self, description: &str, auto_executable: bool) -> Self {
        self.step(StepGroup::Procedure, description, auto_executable)
    }

    pub fn postcheck(self, description: &str, auto_executable: bool) -> Self {
        self.step(StepGroup::Postchecks, description, auto_executable)
    }

    pub fn rollback(self, description: &str, auto_executable: bool) -> Self {
        self.step(StepGroup::Rollback, description, auto_executable)
    }

    pub fn entity(mut self, key: &str, value: Option<&str>) -> Self {
        self.entities
            .insert(key.to_string(), value.map(|v| v.to_string()));
        self
    }

    pub fn warning(mut self, warning: &str) -> Self {
        self.warnings.push(warning.to_string());
        self
    }

    pub fn build(self) -> ClassificationResult {
        ClassificationResult {
            task_id: self.task_id,
            task_name: self.task_name,
            confidence: Some(0.9),
            service: Some("ops".to_string()),
            extracted_entities: self.entities,
            warnings: self.warnings,
            step_groups: Some(self.groups),
        }
    }

    pub fn build_catalog(self) -> StepCatalog {
        StepCatalog::new(self.task_id.clone(), self.task_name.clone(), self.groups)
    }

    /// The `/classify` wire body this runbook would arrive as
    pub fn to_json(&self) -> Value {
        let group = |g: StepGroup| -> Vec<Value> {
            self.groups
                .get(g)
                .iter()
                .map(|s| {
                    json!({
                        "stepNumber": s.step_number,
                        "description": s.description,
                        "method": s.remote_method,
                        "path": s.remote_path,
                        "autoExecutable": s.auto_executable,
                    })
                })
                .collect()
        };
        json!({
            "taskId": self.task_id,
            "taskName": self.task_name,
            "confidence": 0.9,
            "service": "ops",
            "extractedEntities": self.entities,
            "warnings": self.warnings,
            "stepGroups": {
                "prechecks": group(StepGroup::Prechecks),
                "procedure": group(StepGroup::Procedure),
                "postchecks": group(StepGroup::Postchecks),
                "rollback": group(StepGroup::Rollback),
            }
        })
    }
}
