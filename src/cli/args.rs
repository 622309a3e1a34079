//! CLI argument structures
//!
//! This module defines the command-line interface of opsdesk.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Classify operator requests and drive runbook steps
#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "opsdesk - Classify operator requests and drive runbook steps", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file merged above the global and project files
    #[arg(short = 'c', long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive console session
    Run {
        /// First query to classify instead of prompting for one
        #[arg(short = 'q', long)]
        query: Option<String>,
    },

    /// List the task catalog
    Tasks,

    /// Classify a query without executing anything
    Classify {
        /// Free-text description of the operation
        query: String,

        /// Pin the classification to this task
        #[arg(long, value_name = "ID")]
        task_id: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}
