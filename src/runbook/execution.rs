//! Step execution records
//!
//! A [`StepExecution`] exists for every step that has been attempted,
//! parked for approval, or rejected. Its [`ExecutionState`] is a tagged
//! variant, so a completed record always has a result message and a failed
//! one always has an error message.

use crate::catalog::{Step, StepGroup, StepId};
use crate::error::{ConsoleError, ErrorCode, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Flat projection of a step's state, `Pending` meaning "no record"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    ApprovalRequired,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepStatus::Pending => "PENDING",
            StepStatus::Running => "RUNNING",
            StepStatus::Completed => "COMPLETED",
            StepStatus::Failed => "FAILED",
            StepStatus::Cancelled => "CANCELLED",
            StepStatus::ApprovalRequired => "APPROVAL_REQUIRED",
        };
        f.write_str(s)
    }
}

/// What kind of remote call a step performs, derived from its group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepKind {
    Validation,
    ApiExecution,
    Verification,
    Rollback,
}

impl From<StepGroup> for StepKind {
    fn from(group: StepGroup) -> Self {
        match group {
            StepGroup::Prechecks => StepKind::Validation,
            StepGroup::Procedure => StepKind::ApiExecution,
            StepGroup::Postchecks => StepKind::Verification,
            StepGroup::Rollback => StepKind::Rollback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    Running,
    ApprovalRequired,
    Completed {
        message: String,
        status_code: Option<u16>,
    },
    Failed {
        error_message: String,
        status_code: Option<u16>,
    },
    Cancelled,
}

impl ExecutionState {
    pub fn status(&self) -> StepStatus {
        match self {
            ExecutionState::Running => StepStatus::Running,
            ExecutionState::ApprovalRequired => StepStatus::ApprovalRequired,
            ExecutionState::Completed { .. } => StepStatus::Completed,
            ExecutionState::Failed { .. } => StepStatus::Failed,
            ExecutionState::Cancelled => StepStatus::Cancelled,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed { .. }
                | ExecutionState::Failed { .. }
                | ExecutionState::Cancelled
        )
    }

    /// Legal moves once a record exists
    fn can_transition_to(&self, next: &ExecutionState) -> bool {
        matches!(
            (self, next),
            (ExecutionState::Running, ExecutionState::Completed { .. })
                | (ExecutionState::Running, ExecutionState::Failed { .. })
                | (ExecutionState::ApprovalRequired, ExecutionState::Running)
                | (ExecutionState::ApprovalRequired, ExecutionState::Cancelled)
        )
    }
}

/// Normalized reply of the remote execution backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success {
        message: String,
        status_code: Option<u16>,
    },
    Failure {
        error_message: String,
        status_code: Option<u16>,
    },
}

impl ExecutionOutcome {
    pub fn success(message: impl Into<String>, status_code: Option<u16>) -> Self {
        Self::Success {
            message: message.into(),
            status_code,
        }
    }

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self::Failure {
            error_message: error_message.into(),
            status_code: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_state(self) -> ExecutionState {
        match self {
            Self::Success {
                message,
                status_code,
            } => ExecutionState::Completed {
                message,
                status_code,
            },
            Self::Failure {
                error_message,
                status_code,
            } => ExecutionState::Failed {
                error_message,
                status_code,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_id: StepId,
    pub task_id: String,
    pub step_name: String,
    pub kind: StepKind,
    #[serde(flatten)]
    pub state: ExecutionState,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepExecution {
    fn new(step_id: StepId, task_id: &str, step: &Step, state: ExecutionState) -> Self {
        let now = Utc::now();
        Self {
            step_id,
            task_id: task_id.to_string(),
            step_name: step.description.clone(),
            kind: step.group.into(),
            started_at: matches!(state, ExecutionState::Running).then_some(now),
            completed_at: state.is_terminal().then_some(now),
            state,
        }
    }

    /// `absent -> RUNNING`
    pub fn running(step_id: StepId, task_id: &str, step: &Step) -> Self {
        Self::new(step_id, task_id, step, ExecutionState::Running)
    }

    /// `absent -> APPROVAL_REQUIRED`
    pub fn approval_required(step_id: StepId, task_id: &str, step: &Step) -> Self {
        Self::new(step_id, task_id, step, ExecutionState::ApprovalRequired)
    }

    /// `absent -> CANCELLED`
    pub fn cancelled(step_id: StepId, task_id: &str, step: &Step) -> Self {
        Self::new(step_id, task_id, step, ExecutionState::Cancelled)
    }

    /// Move to `next`, refusing anything that is not a forward transition
    pub fn transition(mut self, next: ExecutionState) -> Result<Self> {
        if !self.state.can_transition_to(&next) {
            return Err(ConsoleError::step(
                ErrorCode::STEP_ILLEGAL_TRANSITION,
                format!("cannot move from {} to {}", self.status(), next.status()),
                Some(self.step_id.to_string()),
            ));
        }
        let now = Utc::now();
        if matches!(next, ExecutionState::Running) {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.state = next;
        Ok(self)
    }

    pub fn status(&self) -> StepStatus {
        self.state.status()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn result_message(&self) -> Option<&str> {
        match &self.state {
            ExecutionState::Completed { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ExecutionState::Failed { error_message, .. } => Some(error_message),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match &self.state {
            ExecutionState::Completed { status_code, .. }
            | ExecutionState::Failed { status_code, .. } => *status_code,
            _ => None,
        }
    }
}
