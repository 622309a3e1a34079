//! Command implementation modules
//!
//! Each CLI command is implemented as a separate module.

pub mod classify;
pub mod run;
pub mod tasks;

pub use classify::run_classify_command;
pub use run::{run_console, ConsoleSession, SessionExit};
pub use tasks::run_tasks_command;
