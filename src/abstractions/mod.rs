//! Abstraction layers for the remote backends
//!
//! Trait-based seams over the classification and step-execution services,
//! each with an HTTP implementation and a scripted mock for tests.

pub mod classifier;
pub mod http;
pub mod step_executor;

pub use classifier::{HttpClassifier, MockClassifier, TaskClassifier};
pub use http::BackendClient;
pub use step_executor::{extract_message, HttpStepExecutor, MockStepExecutor, StepExecutor};
