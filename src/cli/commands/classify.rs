//! Classify command implementation
//!
//! Sends one classification request and prints the resulting runbook
//! without executing any step.

use crate::abstractions::{BackendClient, HttpClassifier, TaskClassifier};
use crate::catalog::ClassificationResult;
use crate::cli::render::render_classification;
use crate::config::ConsoleConfig;
use crate::error::common;
use crate::runbook::{Console, SessionSettings};
use anyhow::Result;
use serde_json::{json, Value};

pub async fn run_classify_command(
    config: ConsoleConfig,
    query: String,
    task_id: Option<String>,
    json: bool,
) -> Result<()> {
    let query = query.trim().to_string();
    if query.is_empty() {
        return Err(common::missing_required_field("query").into());
    }
    let console = Console::new(SessionSettings::from_config(&config));
    let classifier = HttpClassifier::new(BackendClient::new(&config)?);

    let request = console.classify_request(&query, task_id);
    let result = classifier.classify(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_json(&result))?);
    } else {
        for line in describe(&result) {
            println!("{line}");
        }
    }
    Ok(())
}

fn describe(result: &ClassificationResult) -> Vec<String> {
    let mut lines = render_classification(result);
    for warning in &result.warnings {
        lines.push(format!("Warning: {}", warning));
    }
    if result.is_unknown() {
        lines.push("The task could not be determined; retry with --task-id".to_string());
        return lines;
    }
    if let Some(catalog) = result.catalog() {
        for step in catalog.iter() {
            let mode = if step.auto_executable { "auto" } else { "manual" };
            lines.push(format!(
                "  [{}] {:>3}. {} ({})",
                step.group, step.step_number, step.description, mode
            ));
        }
    }
    lines
}

fn to_json(result: &ClassificationResult) -> Value {
    let steps: Vec<Value> = result
        .catalog()
        .map(|catalog| {
            catalog
                .iter()
                .map(|step| {
                    json!({
                        "stepId": catalog.step_id(step),
                        "group": step.group,
                        "stepNumber": step.step_number,
                        "description": step.description,
                        "remoteCall": step.remote_call(),
                        "autoExecutable": step.auto_executable,
                    })
                })
                .collect()
        })
        .unwrap_or_default();
    json!({
        "taskId": result.task_id,
        "taskName": result.task_name,
        "confidence": result.confidence,
        "service": result.service,
        "unknown": result.is_unknown(),
        "extractedEntities": result.extracted_entities,
        "warnings": result.warnings,
        "steps": steps,
    })
}
