//! # opsdesk
//!
//! An operator console that turns a free-text request into a classified
//! task and drives the task's runbook against remote operational APIs.
//!
//! ## Usage
//!
//! ```bash
//! opsdesk run [--query "free disk on web-1"]
//! opsdesk tasks
//! opsdesk classify "restart the payments pod" [--task-id ID] [--json]
//! ```
//!
//! ## Modules
//!
//! - `catalog` - Step groups, steps, step ids and classification results
//! - `runbook` - Execution records, the state store, gating, cascade, and the dispatch surface
//! - `abstractions` - Trait seams over the classification and execution backends
//! - `config` - Layered configuration (defaults, files, environment)
//! - `error` - Coded error type shared across the crate
//! - `app` - Logging and fatal error handling for the binary
//! - `interaction` - Operator prompts and terminal display
//! - `cli` - Argument parsing, command routing and board rendering
//! - `testing` - Fixtures shared by unit and integration tests
pub mod abstractions;
pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod interaction;
pub mod runbook;

pub mod testing;

#[cfg(test)]
mod property_tests;
