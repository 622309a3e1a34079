use super::{ConsoleError, ErrorCode};

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    /// Convert to a malformed-classification error
    fn to_classification_error(self, message: impl Into<String>) -> Result<T, ConsoleError>;

    /// Convert to a decode error for a reply from `endpoint`
    fn to_decode_error(
        self,
        message: impl Into<String>,
        endpoint: impl std::fmt::Display,
    ) -> Result<T, ConsoleError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_classification_error(self, message: impl Into<String>) -> Result<T, ConsoleError> {
        self.map_err(|e| {
            ConsoleError::classification_with_code(ErrorCode::CLASSIFICATION_MALFORMED, message)
                .with_source(e)
        })
    }

    fn to_decode_error(
        self,
        message: impl Into<String>,
        endpoint: impl std::fmt::Display,
    ) -> Result<T, ConsoleError> {
        self.map_err(|e| {
            ConsoleError::transport_with_code(
                ErrorCode::TRANSPORT_DECODE,
                message,
                Some(endpoint.to_string()),
            )
            .with_source(e)
        })
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// Create a not found error for configuration
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> ConsoleError {
        ConsoleError::config_with_code(
            ErrorCode::CONFIG_NOT_FOUND,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
    }

    /// Non-success HTTP status from a backend endpoint
    pub fn http_status(endpoint: &str, status: u16, body: &str) -> ConsoleError {
        let detail = if body.trim().is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body.trim())
        };
        ConsoleError::transport_with_code(
            ErrorCode::TRANSPORT_HTTP_STATUS,
            detail,
            Some(endpoint.to_string()),
        )
        .with_status(status)
    }

    /// Step id is not part of the active runbook
    pub fn step_not_found(step_id: &str) -> ConsoleError {
        ConsoleError::step(
            ErrorCode::STEP_NOT_FOUND,
            "not part of the active runbook",
            Some(step_id.to_string()),
        )
    }

    /// A submission for a step that is still in flight
    pub fn already_executing(step_id: &str) -> ConsoleError {
        ConsoleError::step(
            ErrorCode::STEP_ALREADY_EXECUTING,
            "already executing",
            Some(step_id.to_string()),
        )
    }

    /// A step that already has a terminal record
    pub fn already_attempted(step_id: &str, status: impl std::fmt::Display) -> ConsoleError {
        ConsoleError::step(
            ErrorCode::STEP_ALREADY_ATTEMPTED,
            format!("already attempted (status {})", status),
            Some(step_id.to_string()),
        )
    }

    /// A step downstream of a failure
    pub fn blocked(step_id: &str, cause: &str) -> ConsoleError {
        ConsoleError::step(
            ErrorCode::STEP_BLOCKED,
            format!("blocked by failed step {}", cause),
            Some(step_id.to_string()),
        )
    }

    /// Validation error for a missing field
    pub fn missing_required_field(field: &str) -> ConsoleError {
        ConsoleError::validation_with_code(
            ErrorCode::VALIDATION_REQUIRED_FIELD,
            format!("Required field '{}' is missing", field),
            Some(field.to_string()),
        )
    }
}

/// Macro for quick error creation with context
#[macro_export]
macro_rules! console_error {
    (config: $msg:expr) => {
        $crate::error::ConsoleError::config($msg)
    };
    (config: $msg:expr, $source:expr) => {
        $crate::error::ConsoleError::config($msg).with_source($source)
    };
    (transport: $msg:expr) => {
        $crate::error::ConsoleError::transport($msg)
    };
    (transport: $msg:expr, $source:expr) => {
        $crate::error::ConsoleError::transport($msg).with_source($source)
    };
    (classification: $msg:expr) => {
        $crate::error::ConsoleError::classification($msg)
    };
    (validation: $msg:expr) => {
        $crate::error::ConsoleError::validation($msg)
    };
}
