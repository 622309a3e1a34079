//! Gating policy (pure)
//!
//! Decides, for one step, whether it may run unattended, needs explicit
//! approval, or is blocked by an upstream failure. The decision is computed
//! fresh from the catalog and store on every call and never cached: earlier
//! steps can fail asynchronously after a later step was first shown.
//!
//! Rules, in priority order:
//! 1. A step with a record other than `APPROVAL_REQUIRED`, or with a call in
//!    flight, is settled and never offered again.
//! 2. A step is blocked when any step at a lower index in its own group, or
//!    any step in an earlier group of [`GROUP_ORDER`], has `FAILED`.
//! 3. Otherwise it is auto-runnable when `auto_executable`, else it needs
//!    approval.

use super::execution::StepStatus;
use super::store::ExecutionStore;
use crate::catalog::{Step, StepCatalog, StepId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// May be submitted without a human in the loop
    RunnableAuto,
    /// May only run after an operator approves it
    NeedsApproval,
    /// Downstream of the failed step `cause`
    Blocked { cause: StepId },
    /// Already attempted or in flight; carries the current status
    Settled(StepStatus),
}

impl Gate {
    pub fn is_runnable(&self) -> bool {
        matches!(self, Gate::RunnableAuto | Gate::NeedsApproval)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Gate::Blocked { .. })
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::RunnableAuto => f.write_str("RUNNABLE_AUTO"),
            Gate::NeedsApproval => f.write_str("RUNNABLE_NEEDS_APPROVAL"),
            Gate::Blocked { cause } => write!(f, "BLOCKED by {}", cause),
            Gate::Settled(status) => write!(f, "{}", status),
        }
    }
}

/// Evaluate the gate for `step` against the current store
pub fn evaluate(catalog: &StepCatalog, store: &ExecutionStore, step: &Step) -> Gate {
    let step_id = catalog.step_id(step);

    if store.is_executing(&step_id) {
        return Gate::Settled(StepStatus::Running);
    }
    match store.status_of(&step_id) {
        StepStatus::Pending | StepStatus::ApprovalRequired => {}
        settled => return Gate::Settled(settled),
    }

    if let Some(cause) = upstream_failure(catalog, store, step) {
        return Gate::Blocked { cause };
    }

    if step.auto_executable {
        Gate::RunnableAuto
    } else {
        Gate::NeedsApproval
    }
}

/// First failed step causally before `step`, scanning in runbook order
pub fn upstream_failure(catalog: &StepCatalog, store: &ExecutionStore, step: &Step) -> Option<StepId> {
    let earlier_groups = step.group.predecessors().iter().flat_map(|g| catalog.steps(*g));
    let earlier_in_group = catalog.steps(step.group).iter().take(step.index);

    earlier_groups
        .chain(earlier_in_group)
        .map(|s| catalog.step_id(s))
        .find(|id| store.status_of(id) == StepStatus::Failed)
}

/// Gates for every step of the catalog, in `GROUP_ORDER` order
pub fn evaluate_all<'a>(
    catalog: &'a StepCatalog,
    store: &'a ExecutionStore,
) -> impl Iterator<Item = (&'a Step, Gate)> + 'a {
    catalog
        .iter()
        .map(move |s| (s, evaluate(catalog, store, s)))
}
