//! Test fixtures and data builders
//!
//! Shared by unit tests and the integration suites under `tests/`.

pub mod builders;

pub use builders::RunbookBuilder;

use crate::catalog::{
    ClassificationResult, Step, StepCatalog, StepGroup, StepGroups, UNKNOWN_TASK_ID,
};
use std::collections::BTreeMap;

/// A bare step at `(group, index)`
pub fn step(group: StepGroup, index: usize, auto_executable: bool) -> Step {
    Step {
        group,
        index,
        step_number: index as u32 + 1,
        description: format!("{} step {}", group, index),
        remote_method: None,
        remote_path: None,
        auto_executable,
    }
}

/// A catalog assembled from explicit group contents
pub fn catalog(
    task_id: &str,
    prechecks: Vec<Step>,
    procedure: Vec<Step>,
    postchecks: Vec<Step>,
    rollback: Vec<Step>,
) -> StepCatalog {
    StepCatalog::new(
        task_id,
        task_id,
        StepGroups {
            prechecks,
            procedure,
            postchecks,
            rollback,
        },
    )
}

/// Classification answer carrying the unknown-task sentinel
pub fn unknown_classification() -> ClassificationResult {
    ClassificationResult {
        task_id: UNKNOWN_TASK_ID.to_string(),
        task_name: "Unknown".to_string(),
        confidence: Some(0.2),
        service: None,
        extracted_entities: BTreeMap::new(),
        warnings: vec!["Could not determine the task".to_string()],
        step_groups: None,
    }
}
