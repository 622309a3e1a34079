//! CLI command handlers
//!
//! This module contains all CLI-related functionality including:
//! - Argument parsing structures
//! - Command implementations
//! - Step board rendering

pub mod args;
pub mod commands;
pub mod render;
pub mod router;

pub use args::{Cli, Commands};
pub use commands::ConsoleSession;
pub use router::execute_command;
