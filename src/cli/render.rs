//! Text rendering of classifications and the step board

use crate::catalog::{ClassificationResult, StepGroup, StepId, GROUP_ORDER};
use crate::runbook::{BoardRow, Console, Gate, StepAction, StepStatus};

/// Header lines describing a classification
pub fn render_classification(result: &ClassificationResult) -> Vec<String> {
    let mut lines = vec![format!("Task: {} ({})", result.task_name, result.task_id)];
    if let Some(confidence) = result.confidence {
        lines.push(format!("Confidence: {:.0}%", confidence * 100.0));
    }
    if let Some(service) = &result.service {
        lines.push(format!("Service: {}", service));
    }
    // Entities the classifier returned as null are not shown.
    let entities: Vec<String> = result
        .present_entities()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    if !entities.is_empty() {
        lines.push(format!("Entities: {}", entities.join(", ")));
    }
    lines
}

/// The step board, grouped under group titles; empty groups are omitted
pub fn render_board(console: &Console) -> Vec<String> {
    let rows = console.board();
    let mut lines = Vec::new();
    for group in GROUP_ORDER {
        let group_rows: Vec<&BoardRow<'_>> = rows.iter().filter(|r| r.step.group == group).collect();
        if group_rows.is_empty() {
            continue;
        }
        lines.push(group_heading(group));
        for row in group_rows {
            lines.push(render_row(row));
            if let Some(detail) = row_detail(row) {
                lines.push(format!("         {}", detail));
            }
        }
    }
    lines
}

fn group_heading(group: StepGroup) -> String {
    format!("== {} ==", group.title())
}

pub fn render_row(row: &BoardRow<'_>) -> String {
    let approval = if row.step.auto_executable {
        ""
    } else {
        " [manual]"
    };
    format!(
        "  {:>3}. {:<17} {}{}",
        row.step.step_number,
        state_label(row),
        row.step.description,
        approval
    )
}

/// Short state label shown in the board's status column
pub fn state_label(row: &BoardRow<'_>) -> String {
    if row.executing {
        return StepStatus::Running.to_string();
    }
    match &row.gate {
        Gate::RunnableAuto => "READY".to_string(),
        Gate::NeedsApproval => "NEEDS APPROVAL".to_string(),
        Gate::Blocked { .. } => "BLOCKED".to_string(),
        Gate::Settled(status) => status.to_string(),
    }
}

fn row_detail(row: &BoardRow<'_>) -> Option<String> {
    let execution = row.execution?;
    if let Some(message) = execution.error_message() {
        return Some(format!("error: {}", message));
    }
    execution
        .result_message()
        .filter(|m| !m.trim().is_empty())
        .map(|m| format!("result: {}", m))
}

/// Menu label for an offered step action
pub fn action_label(console: &Console, step_id: &StepId, action: StepAction) -> String {
    match console.catalog().and_then(|c| c.find(step_id)) {
        Some(step) => format!(
            "{} step {}: {}",
            action.verb(),
            step.step_number,
            step.description
        ),
        None => format!("{} {}", action.verb(), step_id),
    }
}
