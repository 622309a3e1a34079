//! Cascade controller (pure)
//!
//! Decides what, if anything, should be started automatically after a
//! classification is installed ([`seed`]) or after a step finishes
//! ([`advance`]). The functions only return a [`CascadeDecision`]; the
//! console applies it to the store and emits the effects.
//!
//! Cascades never cross group boundaries. The only automatic entry into a
//! group is the seed of `prechecks`.

use super::execution::{ExecutionOutcome, StepStatus};
use super::gating::{self, Gate};
use super::store::ExecutionStore;
use crate::catalog::{Step, StepCatalog, StepGroup, StepId};
use std::fmt;

/// Why a cascade chain ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The completed step failed
    StepFailed,
    /// No step follows in the same group
    EndOfGroup,
    /// The candidate is downstream of a failure
    Blocked(StepId),
    /// The candidate already ran, is running, or is parked
    Settled(StepStatus),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::StepFailed => f.write_str("step failed"),
            StopReason::EndOfGroup => f.write_str("end of group"),
            StopReason::Blocked(cause) => write!(f, "blocked by {}", cause),
            StopReason::Settled(status) => write!(f, "next step is {}", status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeDecision {
    /// Submit this auto-executable step to the executor
    Submit { step_id: StepId, group: StepGroup, index: usize },
    /// Record `APPROVAL_REQUIRED` for this manually gated step and wait
    ParkForApproval { step_id: StepId },
    /// Nothing to start
    Stop(StopReason),
}

impl CascadeDecision {
    pub fn is_submit(&self) -> bool {
        matches!(self, CascadeDecision::Submit { .. })
    }
}

/// Initial decision for a freshly installed catalog
///
/// Only the first precheck is considered: an auto step is submitted, a
/// manual one is parked. A later auto step is never reached past a manual
/// gate.
pub fn seed(catalog: &StepCatalog, store: &ExecutionStore) -> CascadeDecision {
    match catalog.step(StepGroup::Prechecks, 0) {
        Some(first) => decide(catalog, store, first),
        None => CascadeDecision::Stop(StopReason::EndOfGroup),
    }
}

/// Decision after the step at `completed_index` of `group` finished
///
/// Must be called once per completion, after the outcome has been recorded
/// and the executing mark cleared.
pub fn advance(
    catalog: &StepCatalog,
    store: &ExecutionStore,
    group: StepGroup,
    completed_index: usize,
    outcome: &ExecutionOutcome,
) -> CascadeDecision {
    if !outcome.is_success() {
        return CascadeDecision::Stop(StopReason::StepFailed);
    }
    match catalog.step(group, completed_index + 1) {
        Some(next) => decide(catalog, store, next),
        None => CascadeDecision::Stop(StopReason::EndOfGroup),
    }
}

fn decide(catalog: &StepCatalog, store: &ExecutionStore, candidate: &Step) -> CascadeDecision {
    let step_id = catalog.step_id(candidate);
    match gating::evaluate(catalog, store, candidate) {
        Gate::RunnableAuto => CascadeDecision::Submit {
            step_id,
            group: candidate.group,
            index: candidate.index,
        },
        Gate::NeedsApproval => match store.status_of(&step_id) {
            StepStatus::ApprovalRequired => {
                CascadeDecision::Stop(StopReason::Settled(StepStatus::ApprovalRequired))
            }
            _ => CascadeDecision::ParkForApproval { step_id },
        },
        Gate::Blocked { cause } => CascadeDecision::Stop(StopReason::Blocked(cause)),
        Gate::Settled(status) => CascadeDecision::Stop(StopReason::Settled(status)),
    }
}
