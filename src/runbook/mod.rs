//! Step-execution orchestrator
//!
//! The pure core ([`execution`], [`store`], [`gating`], [`cascade`]) decides
//! what may run; [`console`] applies those decisions behind a dispatch
//! surface; [`driver`] performs the resulting effects against the backends.

pub mod cascade;
pub mod console;
pub mod driver;
pub mod execution;
pub mod gating;
pub mod store;

pub use cascade::{CascadeDecision, StopReason};
pub use console::{
    Action, BoardRow, Console, Effect, Notice, NoticeLevel, Phase, SessionSettings, StepAction,
    Summary,
};
pub use driver::Driver;
pub use execution::{ExecutionOutcome, ExecutionState, StepExecution, StepKind, StepStatus};
pub use gating::Gate;
pub use store::ExecutionStore;
