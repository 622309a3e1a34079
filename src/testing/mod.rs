//! Testing utilities and fixtures
//!
//! Builders for classification results and step catalogs, used across the
//! unit tests and the integration suites.

pub mod fixtures;

pub use fixtures::{catalog, step, unknown_classification, RunbookBuilder};
