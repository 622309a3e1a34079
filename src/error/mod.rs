use std::fmt::Display;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};

/// The unified error type for the opsdesk library
///
/// Nothing in the orchestrator core is fatal to the process: every error is
/// scoped to one request/response cycle or one step, and the session stays
/// usable after it is reported.
#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Transport error: {message}")]
    Transport {
        code: u16,
        message: String,
        endpoint: Option<String>,
        status: Option<u16>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Classification error: {message}")]
    Classification {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Step error: {message}")]
    Step {
        code: u16,
        message: String,
        step_id: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        field: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl ConsoleError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a transport error with default code
    pub fn transport(message: impl Into<String>) -> Self {
        Self::transport_with_code(ErrorCode::TRANSPORT_GENERIC, message, None)
    }

    /// Create a transport error with specific code and endpoint
    pub fn transport_with_code(
        code: u16,
        message: impl Into<String>,
        endpoint: Option<String>,
    ) -> Self {
        Self::Transport {
            code,
            message: message.into(),
            endpoint,
            status: None,
            source: None,
        }
    }

    /// Create a classification error with default code
    pub fn classification(message: impl Into<String>) -> Self {
        Self::classification_with_code(ErrorCode::CLASSIFICATION_GENERIC, message)
    }

    /// Create a classification error with specific code
    pub fn classification_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Classification {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create a step error with specific code and step id
    pub fn step(code: u16, message: impl Into<String>, step_id: Option<String>) -> Self {
        Self::Step {
            code,
            message: message.into(),
            step_id,
            source: None,
        }
    }

    /// Create a validation error with default code
    pub fn validation(message: impl Into<String>) -> Self {
        Self::validation_with_code(ErrorCode::VALIDATION_GENERIC, message, None)
    }

    /// Create a validation error with specific code and field
    pub fn validation_with_code(
        code: u16,
        message: impl Into<String>,
        field: Option<String>,
    ) -> Self {
        Self::Validation {
            code,
            message: message.into(),
            field,
            source: None,
        }
    }

    /// Create a generic other error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Transport { source: src, .. }
            | Self::Classification { source: src, .. }
            | Self::Step { source: src, .. }
            | Self::Validation { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Transport { message, .. }
            | Self::Classification { message, .. }
            | Self::Step { message, .. }
            | Self::Validation { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Set the HTTP status for a transport error
    pub fn with_status(mut self, status: u16) -> Self {
        if let Self::Transport {
            status: ref mut s, ..
        } = self
        {
            *s = Some(status);
        }
        self
    }

    /// Set the step id for a step error
    pub fn with_step(mut self, step_id: impl Into<String>) -> Self {
        if let Self::Step {
            step_id: ref mut s, ..
        } = self
        {
            *s = Some(step_id.into());
        }
        self
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Transport { .. } => 3,
            Self::Classification { .. } => 4,
            Self::Step { .. } => 5,
            Self::Validation { .. } => 8,
            Self::Other { .. } => 1,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Transport { code, .. }
            | Self::Classification { code, .. }
            | Self::Step { code, .. }
            | Self::Validation { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// HTTP status attached to a transport error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, .. } => format!("Configuration problem: {}", message),
            Self::Transport {
                message,
                endpoint,
                status,
                ..
            } => {
                let mut msg = String::from("Could not reach backend");
                if let Some(e) = endpoint {
                    msg.push_str(&format!(" at {}", e));
                }
                if let Some(s) = status {
                    msg.push_str(&format!(" (HTTP {})", s));
                }
                format!("{}: {}", msg, message)
            }
            Self::Classification { message, .. } => {
                format!("Classification failed: {}", message)
            }
            Self::Step {
                message, step_id, ..
            } => {
                if let Some(id) = step_id {
                    format!("Step {}: {}", id, message)
                } else {
                    format!("Step error: {}", message)
                }
            }
            Self::Validation { message, field, .. } => {
                if let Some(f) = field {
                    format!("Invalid '{}': {}", f, message)
                } else {
                    format!("Invalid input: {}", message)
                }
            }
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        out
    }

    /// Whether a fresh user action could plausibly succeed
    ///
    /// Only transport problems qualify; retries are never automatic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { code, status, .. } => {
                *code == ErrorCode::TRANSPORT_CONNECT
                    || *code == ErrorCode::TRANSPORT_TIMEOUT
                    || status.map(|s| s >= 500 || s == 429).unwrap_or(false)
            }
            _ => false,
        }
    }

    /// True for the double-submission guard, which callers may ignore
    pub fn is_double_submission(&self) -> bool {
        self.code() == ErrorCode::STEP_ALREADY_EXECUTING
    }
}

/// Type alias for Results using ConsoleError
pub type Result<T> = std::result::Result<T, ConsoleError>;

/// Type alias for application Results (using anyhow for flexibility)
pub type AppResult<T> = anyhow::Result<T>;

impl From<std::io::Error> for ConsoleError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let (code, message) = match err.kind() {
            ErrorKind::NotFound => (ErrorCode::CONFIG_NOT_FOUND, "File not found"),
            ErrorKind::InvalidInput => (ErrorCode::VALIDATION_INVALID_INPUT, "Invalid input"),
            ErrorKind::InvalidData => (ErrorCode::VALIDATION_INVALID_DATA, "Invalid data"),
            _ => (ErrorCode::OTHER_IO, "IO operation failed"),
        };

        match code {
            ErrorCode::CONFIG_NOT_FOUND => ConsoleError::config_with_code(code, message),
            ErrorCode::OTHER_IO => ConsoleError::Other {
                code,
                message: message.to_string(),
                source: None,
            },
            _ => ConsoleError::validation_with_code(code, message, None),
        }
        .with_source(err)
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::transport_with_code(
            ErrorCode::TRANSPORT_DECODE,
            "Invalid JSON payload",
            None,
        )
        .with_source(err)
    }
}

impl From<toml::de::Error> for ConsoleError {
    fn from(err: toml::de::Error) -> Self {
        ConsoleError::config_with_code(ErrorCode::CONFIG_INVALID_TOML, "Invalid TOML syntax")
            .with_source(err)
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::TRANSPORT_TIMEOUT
        } else if err.is_connect() {
            ErrorCode::TRANSPORT_CONNECT
        } else if err.is_decode() {
            ErrorCode::TRANSPORT_DECODE
        } else if err.is_status() {
            ErrorCode::TRANSPORT_HTTP_STATUS
        } else {
            ErrorCode::TRANSPORT_GENERIC
        };
        let endpoint = err.url().map(|u| u.to_string());
        let status = err.status().map(|s| s.as_u16());
        let mut converted = ConsoleError::transport_with_code(code, err.to_string(), endpoint);
        if let Some(s) = status {
            converted = converted.with_status(s);
        }
        converted.with_source(err)
    }
}
