//! Step catalog model
//!
//! Immutable description of a classified task's runbook: four ordered step
//! groups, each holding steps in the order the classifier declared them.
//! The catalog is produced once per classification response and only read
//! afterwards; execution state lives in [`crate::runbook::store`].

pub mod classification;
pub mod wire;

pub use classification::{ClassificationResult, TaskSummary, UNKNOWN_TASK_ID};

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four fixed runbook phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepGroup {
    Prechecks,
    Procedure,
    Postchecks,
    Rollback,
}

/// The global group sequence. Gating and cascading both read this constant.
pub const GROUP_ORDER: [StepGroup; 4] = [
    StepGroup::Prechecks,
    StepGroup::Procedure,
    StepGroup::Postchecks,
    StepGroup::Rollback,
];

impl StepGroup {
    /// Position of this group in [`GROUP_ORDER`]
    pub fn position(self) -> usize {
        match self {
            StepGroup::Prechecks => 0,
            StepGroup::Procedure => 1,
            StepGroup::Postchecks => 2,
            StepGroup::Rollback => 3,
        }
    }

    /// Groups strictly before this one
    pub fn predecessors(self) -> &'static [StepGroup] {
        match self {
            StepGroup::Prechecks => &[],
            StepGroup::Procedure => &[StepGroup::Prechecks],
            StepGroup::Postchecks => &[StepGroup::Prechecks, StepGroup::Procedure],
            StepGroup::Rollback => &[
                StepGroup::Prechecks,
                StepGroup::Procedure,
                StepGroup::Postchecks,
            ],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepGroup::Prechecks => "prechecks",
            StepGroup::Procedure => "procedure",
            StepGroup::Postchecks => "postchecks",
            StepGroup::Rollback => "rollback",
        }
    }

    /// Heading used by the board renderer
    pub fn title(self) -> &'static str {
        match self {
            StepGroup::Prechecks => "Pre-checks",
            StepGroup::Procedure => "Procedure",
            StepGroup::Postchecks => "Post-checks",
            StepGroup::Rollback => "Rollback",
        }
    }
}

impl fmt::Display for StepGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthetic step identity, the join key between catalog and store
///
/// Derived from `(task_id, group, index_in_group)` so that the same step
/// resolves to the same id for the lifetime of one classification response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn derive(task_id: &str, group: StepGroup, index: usize) -> Self {
        Self(format!("{}:{}:{}", task_id, group, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A single runbook step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub group: StepGroup,
    /// Zero-based position inside `group`
    pub index: usize,
    /// Number the execution backend knows this step by
    pub step_number: u32,
    pub description: String,
    pub remote_method: Option<String>,
    pub remote_path: Option<String>,
    pub auto_executable: bool,
}

impl Step {
    /// `METHOD /path` descriptor, when the classifier supplied one
    pub fn remote_call(&self) -> Option<String> {
        match (&self.remote_method, &self.remote_path) {
            (Some(m), Some(p)) => Some(format!("{} {}", m.to_uppercase(), p)),
            (None, Some(p)) => Some(p.clone()),
            _ => None,
        }
    }
}

/// Steps of a runbook, bucketed by group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepGroups {
    pub prechecks: Vec<Step>,
    pub procedure: Vec<Step>,
    pub postchecks: Vec<Step>,
    pub rollback: Vec<Step>,
}

impl StepGroups {
    pub fn get(&self, group: StepGroup) -> &[Step] {
        match group {
            StepGroup::Prechecks => &self.prechecks,
            StepGroup::Procedure => &self.procedure,
            StepGroup::Postchecks => &self.postchecks,
            StepGroup::Rollback => &self.rollback,
        }
    }

    pub fn get_mut(&mut self, group: StepGroup) -> &mut Vec<Step> {
        match group {
            StepGroup::Prechecks => &mut self.prechecks,
            StepGroup::Procedure => &mut self.procedure,
            StepGroup::Postchecks => &mut self.postchecks,
            StepGroup::Rollback => &mut self.rollback,
        }
    }

    pub fn len(&self) -> usize {
        GROUP_ORDER.iter().map(|g| self.get(*g).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The immutable runbook of one classified task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCatalog {
    task_id: String,
    task_name: String,
    groups: StepGroups,
}

impl StepCatalog {
    pub fn new(task_id: impl Into<String>, task_name: impl Into<String>, groups: StepGroups) -> Self {
        Self {
            task_id: task_id.into(),
            task_name: task_name.into(),
            groups,
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn steps(&self, group: StepGroup) -> &[Step] {
        self.groups.get(group)
    }

    pub fn step(&self, group: StepGroup, index: usize) -> Option<&Step> {
        self.groups.get(group).get(index)
    }

    pub fn step_id(&self, step: &Step) -> StepId {
        StepId::derive(&self.task_id, step.group, step.index)
    }

    /// All steps in runbook order
    pub fn iter(&self) -> impl Iterator<Item = &Step> {
        GROUP_ORDER
            .into_iter()
            .flat_map(move |g| self.groups.get(g).iter())
    }

    /// Resolve a step id back to its step
    pub fn find(&self, step_id: &StepId) -> Option<&Step> {
        self.iter().find(|s| &self.step_id(s) == step_id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
