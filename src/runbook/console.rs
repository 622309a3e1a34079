//! Console state and the dispatch surface
//!
//! [`Console::dispatch`] is the only way state changes. It runs
//! synchronously, applies gating and cascade decisions to the execution
//! store, and returns the [`Effect`]s the driver must perform. Remote
//! results come back as actions, so every decision happens between two
//! suspension points and no two decisions for the same step interleave.

use super::cascade::{self, CascadeDecision};
use super::execution::{ExecutionOutcome, ExecutionState, StepExecution, StepStatus};
use super::gating::{self, Gate};
use super::store::ExecutionStore;
use crate::catalog::wire::{ClassifyRequest, ExecuteStepRequest, RequestContext};
use crate::catalog::{
    ClassificationResult, Step, StepCatalog, StepGroup, StepId, TaskSummary, GROUP_ORDER,
};
use crate::config::ConsoleConfig;
use crate::error::{common, ConsoleError, ErrorCode, Result};
use chrono::Utc;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-session values copied into outgoing requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub user_id: String,
    pub environment: String,
    /// Debounce applied to cascade submissions
    pub cascade_delay: Duration,
}

impl SessionSettings {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        Self {
            user_id: config.user_id.clone(),
            environment: config.environment.clone(),
            cascade_delay: Duration::from_millis(config.cascade_delay_ms),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&ConsoleConfig::default())
    }
}

#[derive(Debug)]
pub enum Action {
    SubmitQuery { query: String },
    SelectTask { task_id: String },
    RunStep { step_id: StepId },
    ApproveStep { step_id: StepId },
    RejectStep { step_id: StepId },
    /// The outstanding classification answered
    Classified { result: ClassificationResult },
    /// The outstanding classification could not be completed
    ClassificationFailed { error: ConsoleError },
    /// A submitted step came back
    StepFinished {
        generation: u64,
        step_id: StepId,
        outcome: ExecutionOutcome,
    },
}

/// Side effects requested by a dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Classify(ClassifyRequest),
    Execute {
        generation: u64,
        step_id: StepId,
        request: ExecuteStepRequest,
        delay: Duration,
    },
    Notify(Notice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A user-visible banner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No query submitted yet
    Idle,
    /// A classification request is outstanding
    Classifying,
    /// The classifier answered with the unknown task
    AwaitingTaskChoice,
    /// A runbook is installed
    Ready,
}

/// One line of the step board
#[derive(Debug, Clone)]
pub struct BoardRow<'a> {
    pub step_id: StepId,
    pub step: &'a Step,
    pub gate: Gate,
    pub execution: Option<&'a StepExecution>,
    pub executing: bool,
}

impl BoardRow<'_> {
    /// Status for display, treating an in-flight call as running
    pub fn status(&self) -> StepStatus {
        if self.executing {
            return StepStatus::Running;
        }
        self.execution
            .map(StepExecution::status)
            .unwrap_or(StepStatus::Pending)
    }
}

/// Operator actions currently on offer for a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Run,
    Approve,
    Reject,
}

impl StepAction {
    pub fn into_action(self, step_id: StepId) -> Action {
        match self {
            StepAction::Run => Action::RunStep { step_id },
            StepAction::Approve => Action::ApproveStep { step_id },
            StepAction::Reject => Action::RejectStep { step_id },
        }
    }

    pub fn verb(self) -> &'static str {
        match self {
            StepAction::Run => "Run",
            StepAction::Approve => "Approve",
            StepAction::Reject => "Reject",
        }
    }
}

/// Step counts per status over the active runbook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub approval_required: usize,
    pub blocked: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps: {} completed, {} failed, {} cancelled, {} running, {} awaiting approval, {} blocked, {} pending",
            self.total,
            self.completed,
            self.failed,
            self.cancelled,
            self.running,
            self.approval_required,
            self.blocked,
            self.pending
        )
    }
}

/// The orchestrator state for one operator session
#[derive(Debug, Default)]
pub struct Console {
    settings: SessionSettings,
    tasks: Vec<TaskSummary>,
    query: Option<String>,
    classifying: bool,
    classification: Option<ClassificationResult>,
    catalog: Option<StepCatalog>,
    store: ExecutionStore,
    generation: u64,
}

impl Console {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Install the static task catalog used for disambiguation
    pub fn set_tasks(&mut self, tasks: Vec<TaskSummary>) {
        self.tasks = tasks;
    }

    pub fn tasks(&self) -> &[TaskSummary] {
        &self.tasks
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    pub fn catalog(&self) -> Option<&StepCatalog> {
        self.catalog.as_ref()
    }

    pub fn store(&self) -> &ExecutionStore {
        &self.store
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        if self.classifying {
            Phase::Classifying
        } else if self.catalog.is_some() {
            Phase::Ready
        } else if self.classification.is_some() {
            Phase::AwaitingTaskChoice
        } else {
            Phase::Idle
        }
    }

    pub fn execution(&self, step_id: &StepId) -> Option<&StepExecution> {
        self.store.get(step_id)
    }

    pub fn executing_steps(&self) -> Vec<StepId> {
        self.store.executing().cloned().collect()
    }

    /// Nothing is in flight, neither a classification nor a step
    pub fn is_settled(&self) -> bool {
        !self.classifying && self.store.executing().next().is_none()
    }

    /// Gate of `step_id` against the current store
    pub fn gate(&self, step_id: &StepId) -> Result<Gate> {
        let catalog = self.active_catalog()?;
        let step = catalog
            .find(step_id)
            .ok_or_else(|| common::step_not_found(step_id.as_str()))?;
        Ok(gating::evaluate(catalog, &self.store, step))
    }

    /// The step board, one row per step in runbook order
    pub fn board(&self) -> Vec<BoardRow<'_>> {
        let Some(catalog) = &self.catalog else {
            return Vec::new();
        };
        GROUP_ORDER
            .iter()
            .flat_map(|g| catalog.steps(*g))
            .map(|step| {
                let step_id = catalog.step_id(step);
                BoardRow {
                    gate: gating::evaluate(catalog, &self.store, step),
                    execution: self.store.get(&step_id),
                    executing: self.store.is_executing(&step_id),
                    step,
                    step_id,
                }
            })
            .collect()
    }

    /// Actions an operator may take right now, in runbook order
    pub fn available_actions(&self) -> Vec<(StepId, StepAction)> {
        self.board()
            .into_iter()
            .flat_map(|row| {
                let actions: &[StepAction] = match row.gate {
                    Gate::RunnableAuto => &[StepAction::Run],
                    Gate::NeedsApproval => &[StepAction::Approve, StepAction::Reject],
                    _ => &[],
                };
                actions.iter().map(move |a| (row.step_id.clone(), *a))
            })
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for row in self.board() {
            summary.total += 1;
            if row.gate.is_blocked() {
                summary.blocked += 1;
            }
            match row.status() {
                StepStatus::Pending => summary.pending += 1,
                StepStatus::Running => summary.running += 1,
                StepStatus::Completed => summary.completed += 1,
                StepStatus::Failed => summary.failed += 1,
                StepStatus::Cancelled => summary.cancelled += 1,
                StepStatus::ApprovalRequired => summary.approval_required += 1,
            }
        }
        summary
    }

    /// Apply one action and return the effects it requests
    ///
    /// A rejected action leaves the console untouched.
    pub fn dispatch(&mut self, action: Action) -> Result<Vec<Effect>> {
        match action {
            Action::SubmitQuery { query } => self.submit_query(query),
            Action::SelectTask { task_id } => self.select_task(task_id),
            Action::RunStep { step_id } => self.run_step(&step_id),
            Action::ApproveStep { step_id } => self.approve_step(&step_id),
            Action::RejectStep { step_id } => self.reject_step(&step_id),
            Action::Classified { result } => self.install_classification(result),
            Action::ClassificationFailed { error } => Ok(self.classification_failed(error)),
            Action::StepFinished {
                generation,
                step_id,
                outcome,
            } => self.step_finished(generation, step_id, outcome),
        }
    }

    fn submit_query(&mut self, query: String) -> Result<Vec<Effect>> {
        let query = query.trim().to_string();
        if query.is_empty() {
            return Err(common::missing_required_field("query"));
        }
        self.ensure_not_classifying()?;

        info!("Submitting query for classification");
        let request = self.classify_request(&query, None);
        self.discard_runbook();
        self.query = Some(query);
        self.classifying = true;
        Ok(vec![Effect::Classify(request)])
    }

    fn select_task(&mut self, task_id: String) -> Result<Vec<Effect>> {
        self.ensure_not_classifying()?;
        let query = self
            .query
            .clone()
            .ok_or_else(|| common::missing_required_field("query"))?;
        let task_id = task_id.trim().to_string();
        if task_id.is_empty() {
            return Err(common::missing_required_field("task_id"));
        }
        if !self.tasks.is_empty() && !self.tasks.iter().any(|t| t.task_id == task_id) {
            return Err(ConsoleError::classification_with_code(
                ErrorCode::CLASSIFICATION_UNKNOWN_TASK,
                format!("'{}' is not in the task catalog", task_id),
            ));
        }

        info!(task_id = %task_id, "Re-classifying with an explicit task");
        let request = self.classify_request(&query, Some(task_id));
        self.discard_runbook();
        self.classifying = true;
        Ok(vec![Effect::Classify(request)])
    }

    fn run_step(&mut self, step_id: &StepId) -> Result<Vec<Effect>> {
        let step = self.offered_step(step_id)?;
        match self.gate(step_id)? {
            Gate::RunnableAuto => {}
            Gate::NeedsApproval => {
                return Err(ConsoleError::step(
                    ErrorCode::STEP_NEEDS_APPROVAL,
                    "requires approval before it can run",
                    Some(step_id.to_string()),
                ))
            }
            other => return Err(refusal(step_id, other)),
        }
        self.submit(step_id.clone(), &step, Duration::ZERO)
    }

    fn approve_step(&mut self, step_id: &StepId) -> Result<Vec<Effect>> {
        let step = self.offered_step(step_id)?;
        self.ensure_awaiting_approval(step_id)?;
        info!(step_id = %step_id, "Step approved");
        self.submit(step_id.clone(), &step, Duration::ZERO)
    }

    fn reject_step(&mut self, step_id: &StepId) -> Result<Vec<Effect>> {
        let step = self.offered_step(step_id)?;
        self.ensure_awaiting_approval(step_id)?;

        let cancelled = match self.store.get(step_id) {
            Some(parked) => parked.clone().transition(ExecutionState::Cancelled)?,
            None => StepExecution::cancelled(step_id.clone(), self.task_id(), &step),
        };
        self.store = self.store.record(cancelled);
        info!(step_id = %step_id, "Step rejected");
        Ok(vec![Effect::Notify(Notice::info(format!(
            "Step {} cancelled: {}",
            step.step_number, step.description
        )))])
    }

    fn install_classification(&mut self, result: ClassificationResult) -> Result<Vec<Effect>> {
        if !self.classifying {
            warn!(task_id = %result.task_id, "Dropping classification nobody is waiting for");
            return Ok(Vec::new());
        }
        self.classifying = false;
        self.catalog = result.catalog();

        let mut effects: Vec<Effect> = result
            .warnings
            .iter()
            .map(|w| Effect::Notify(Notice::warning(w.clone())))
            .collect();

        if result.is_unknown() {
            info!("Classifier could not determine the task");
            effects.push(Effect::Notify(Notice::info(
                "Could not determine the task; choose one from the catalog",
            )));
            self.classification = Some(result);
            return Ok(effects);
        }

        info!(
            task_id = %result.task_id,
            steps = self.catalog.as_ref().map(StepCatalog::len).unwrap_or(0),
            generation = self.generation,
            "Classification installed"
        );
        self.classification = Some(result);

        let decision = match &self.catalog {
            Some(catalog) => cascade::seed(catalog, &self.store),
            None => return Ok(effects),
        };
        effects.extend(self.apply(decision)?);
        Ok(effects)
    }

    fn classification_failed(&mut self, error: ConsoleError) -> Vec<Effect> {
        warn!(error = %error, "Classification request failed");
        self.classifying = false;
        vec![Effect::Notify(Notice::error(error.user_message()))]
    }

    fn step_finished(
        &mut self,
        generation: u64,
        step_id: StepId,
        outcome: ExecutionOutcome,
    ) -> Result<Vec<Effect>> {
        if generation != self.generation {
            warn!(
                step_id = %step_id,
                generation,
                current = self.generation,
                "Dropping completion from a previous classification"
            );
            return Ok(Vec::new());
        }
        let catalog = self.active_catalog()?;
        let step = catalog
            .find(&step_id)
            .cloned()
            .ok_or_else(|| common::step_not_found(step_id.as_str()))?;

        let running = match self.store.get(&step_id) {
            Some(existing) => existing.clone(),
            None => StepExecution::running(step_id.clone(), self.task_id(), &step),
        };
        let finished = running.transition(outcome.clone().into_state())?;

        let mut effects = Vec::new();
        match &outcome {
            ExecutionOutcome::Success { .. } => {
                info!(step_id = %step_id, "Step completed");
            }
            ExecutionOutcome::Failure { error_message, .. } => {
                warn!(step_id = %step_id, error = %error_message, "Step failed");
                effects.push(Effect::Notify(Notice::warning(format!(
                    "Step {} failed: {}",
                    step.step_number, error_message
                ))));
            }
        }
        self.store = self.store.clear_executing(&step_id).record(finished);

        let decision = match &self.catalog {
            Some(catalog) => cascade::advance(catalog, &self.store, step.group, step.index, &outcome),
            None => return Ok(effects),
        };
        effects.extend(self.apply(decision)?);
        Ok(effects)
    }

    fn apply(&mut self, decision: CascadeDecision) -> Result<Vec<Effect>> {
        match decision {
            CascadeDecision::Submit {
                step_id,
                group,
                index,
            } => {
                let step = self.step_at(group, index)?;
                debug!(step_id = %step_id, "Cascade submits next step");
                let delay = self.settings.cascade_delay;
                self.submit(step_id, &step, delay)
            }
            CascadeDecision::ParkForApproval { step_id } => {
                let catalog = self.active_catalog()?;
                let step = catalog
                    .find(&step_id)
                    .cloned()
                    .ok_or_else(|| common::step_not_found(step_id.as_str()))?;
                debug!(step_id = %step_id, "Cascade parked at a manual gate");
                let parked = StepExecution::approval_required(step_id, self.task_id(), &step);
                self.store = self.store.record(parked);
                Ok(vec![Effect::Notify(Notice::info(format!(
                    "Step {} awaits approval: {}",
                    step.step_number, step.description
                )))])
            }
            CascadeDecision::Stop(reason) => {
                debug!(reason = %reason, "Cascade stopped");
                Ok(Vec::new())
            }
        }
    }

    /// Mark `step_id` executing, record `RUNNING`, and request the call
    fn submit(&mut self, step_id: StepId, step: &Step, delay: Duration) -> Result<Vec<Effect>> {
        let marked = self.store.mark_executing(&step_id)?;
        let running = match marked.get(&step_id) {
            Some(parked) => parked.clone().transition(ExecutionState::Running)?,
            None => StepExecution::running(step_id.clone(), self.task_id(), step),
        };
        self.store = marked.record(running);

        let request = ExecuteStepRequest {
            task_id: self.task_id().to_string(),
            step_number: step.step_number,
            entities: self
                .classification
                .as_ref()
                .map(|c| c.extracted_entities.clone())
                .unwrap_or_default(),
        };
        info!(step_id = %step_id, step_number = step.step_number, "Step submitted");
        Ok(vec![Effect::Execute {
            generation: self.generation,
            step_id,
            request,
            delay,
        }])
    }

    /// Classification request for `query` carrying this session's identity
    pub fn classify_request(&self, query: &str, task_id: Option<String>) -> ClassifyRequest {
        ClassifyRequest {
            query: query.to_string(),
            user_id: self.settings.user_id.clone(),
            environment: self.settings.environment.clone(),
            task_id,
            context: RequestContext {
                reason: "console request".to_string(),
                priority: "normal".to_string(),
                requested_by: self.settings.user_id.clone(),
                timestamp: Utc::now().to_rfc3339(),
            },
        }
    }

    /// Drop the installed runbook and its records
    ///
    /// Completions still in flight carry the old generation and are ignored
    /// when they land.
    fn discard_runbook(&mut self) {
        self.generation += 1;
        self.classification = None;
        self.catalog = None;
        self.store = ExecutionStore::new();
    }

    fn ensure_not_classifying(&self) -> Result<()> {
        if self.classifying {
            return Err(ConsoleError::classification_with_code(
                ErrorCode::CLASSIFICATION_IN_PROGRESS,
                "a classification request is already outstanding",
            ));
        }
        Ok(())
    }

    fn ensure_awaiting_approval(&self, step_id: &StepId) -> Result<()> {
        match self.gate(step_id)? {
            Gate::NeedsApproval => Ok(()),
            Gate::RunnableAuto => Err(ConsoleError::step(
                ErrorCode::STEP_NOT_AWAITING_APPROVAL,
                "runs without approval",
                Some(step_id.to_string()),
            )),
            other => Err(refusal(step_id, other)),
        }
    }

    /// Resolve a step id of the active runbook
    fn offered_step(&self, step_id: &StepId) -> Result<Step> {
        let catalog = self.active_catalog()?;
        catalog
            .find(step_id)
            .cloned()
            .ok_or_else(|| common::step_not_found(step_id.as_str()))
    }

    fn step_at(&self, group: StepGroup, index: usize) -> Result<Step> {
        let catalog = self.active_catalog()?;
        catalog.step(group, index).cloned().ok_or_else(|| {
            common::step_not_found(StepId::derive(catalog.task_id(), group, index).as_str())
        })
    }

    fn active_catalog(&self) -> Result<&StepCatalog> {
        self.catalog.as_ref().ok_or_else(|| {
            ConsoleError::step(ErrorCode::NO_ACTIVE_RUNBOOK, "no runbook is installed", None)
        })
    }

    fn task_id(&self) -> &str {
        self.catalog.as_ref().map(StepCatalog::task_id).unwrap_or("")
    }
}

/// Error for a gate that refuses every operator action
fn refusal(step_id: &StepId, gate: Gate) -> ConsoleError {
    match gate {
        Gate::Blocked { cause } => common::blocked(step_id.as_str(), cause.as_str()),
        Gate::Settled(StepStatus::Running) => common::already_executing(step_id.as_str()),
        Gate::Settled(status) => common::already_attempted(step_id.as_str(), status),
        Gate::RunnableAuto | Gate::NeedsApproval => ConsoleError::step(
            ErrorCode::STEP_GENERIC,
            format!("unexpected gate {}", gate),
            Some(step_id.to_string()),
        ),
    }
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod console_tests;
