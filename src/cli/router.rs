//! Command routing and execution
//!
//! This module handles routing CLI commands to their respective implementations.

use crate::cli::args::Commands;
use crate::cli::commands::{run_classify_command, run_console, run_tasks_command};
use crate::config::ConsoleConfig;
use anyhow::Result;

/// Execute a CLI command with the loaded configuration
pub async fn execute_command(command: Commands, config: ConsoleConfig) -> Result<()> {
    match command {
        Commands::Run { query } => run_console(config, query).await,
        Commands::Tasks => run_tasks_command(config).await,
        Commands::Classify {
            query,
            task_id,
            json,
        } => run_classify_command(config, query, task_id, json).await,
    }
}
