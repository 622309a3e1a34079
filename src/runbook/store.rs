//! Execution state store
//!
//! The single source of truth for what has run. Every operation takes the
//! store by shared reference and returns the next store, leaving the input
//! untouched, so a rejected update can never leave half-applied state
//! behind.
//!
//! Two disjoint structures are kept:
//! - `records`: last-write-wins map from [`StepId`] to [`StepExecution`]
//! - `executing`: ids with an outstanding remote call, used as the
//!   double-submission guard

use super::execution::{StepExecution, StepStatus};
use crate::catalog::StepId;
use crate::error::{common, Result};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionStore {
    records: BTreeMap<StepId, StepExecution>,
    executing: BTreeSet<StepId>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `execution.step_id`
    pub fn record(&self, execution: StepExecution) -> Self {
        let mut next = self.clone();
        next.records.insert(execution.step_id.clone(), execution);
        next
    }

    pub fn get(&self, step_id: &StepId) -> Option<&StepExecution> {
        self.records.get(step_id)
    }

    /// Status of a step, `Pending` when no record exists
    pub fn status_of(&self, step_id: &StepId) -> StepStatus {
        self.get(step_id)
            .map(StepExecution::status)
            .unwrap_or(StepStatus::Pending)
    }

    /// Claim the in-flight slot for `step_id`
    ///
    /// Fails with `STEP_ALREADY_EXECUTING` when a call is still outstanding.
    pub fn mark_executing(&self, step_id: &StepId) -> Result<Self> {
        if self.executing.contains(step_id) {
            return Err(common::already_executing(step_id.as_str()));
        }
        let mut next = self.clone();
        next.executing.insert(step_id.clone());
        Ok(next)
    }

    /// Release the in-flight slot; a no-op when it was not held
    pub fn clear_executing(&self, step_id: &StepId) -> Self {
        let mut next = self.clone();
        next.executing.remove(step_id);
        next
    }

    pub fn is_executing(&self, step_id: &StepId) -> bool {
        self.executing.contains(step_id)
    }

    pub fn executing(&self) -> impl Iterator<Item = &StepId> {
        self.executing.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &StepExecution> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.executing.is_empty()
    }
}
