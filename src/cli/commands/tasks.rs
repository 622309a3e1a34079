//! Tasks command implementation

use crate::abstractions::{BackendClient, HttpClassifier, TaskClassifier};
use crate::catalog::TaskSummary;
use crate::config::ConsoleConfig;
use anyhow::Result;

/// Print the task catalog, one task per line
pub async fn run_tasks_command(config: ConsoleConfig) -> Result<()> {
    let classifier = HttpClassifier::new(BackendClient::new(&config)?);
    let tasks = classifier.list_tasks().await?;
    if tasks.is_empty() {
        println!("No tasks available");
        return Ok(());
    }
    for line in format_tasks(&tasks) {
        println!("{line}");
    }
    Ok(())
}

fn format_tasks(tasks: &[TaskSummary]) -> Vec<String> {
    let width = tasks.iter().map(|t| t.task_id.len()).max().unwrap_or(0);
    tasks
        .iter()
        .map(|t| match &t.description {
            Some(d) if !d.trim().is_empty() => {
                format!("{:<width$}  {} - {}", t.task_id, t.task_name, d)
            }
            _ => format!("{:<width$}  {}", t.task_id, t.task_name),
        })
        .collect()
}
