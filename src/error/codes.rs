/// Error code registry for opsdesk
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Transport errors (classify, tasks, execute-step)
/// - 3000-3999: Classification errors
/// - 4000-4999: Step errors (gating, double submission, transitions)
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_INVALID_URL: u16 = 1004;
    pub const CONFIG_PATH_ERROR: u16 = 1005;

    // Transport errors (2000-2999)
    pub const TRANSPORT_GENERIC: u16 = 2000;
    pub const TRANSPORT_CONNECT: u16 = 2001;
    pub const TRANSPORT_TIMEOUT: u16 = 2002;
    pub const TRANSPORT_HTTP_STATUS: u16 = 2003;
    pub const TRANSPORT_DECODE: u16 = 2004;
    pub const TRANSPORT_CLIENT_BUILD: u16 = 2005;

    // Classification errors (3000-3999)
    pub const CLASSIFICATION_GENERIC: u16 = 3000;
    pub const CLASSIFICATION_MALFORMED: u16 = 3001;
    pub const CLASSIFICATION_UNKNOWN_TASK: u16 = 3002;
    pub const CLASSIFICATION_IN_PROGRESS: u16 = 3003;

    // Step errors (4000-4999)
    pub const STEP_GENERIC: u16 = 4000;
    pub const STEP_NOT_FOUND: u16 = 4001;
    pub const STEP_ALREADY_EXECUTING: u16 = 4002;
    pub const STEP_ALREADY_ATTEMPTED: u16 = 4003;
    pub const STEP_BLOCKED: u16 = 4004;
    pub const STEP_NEEDS_APPROVAL: u16 = 4005;
    pub const STEP_NOT_AWAITING_APPROVAL: u16 = 4006;
    pub const STEP_ILLEGAL_TRANSITION: u16 = 4007;
    pub const NO_ACTIVE_RUNBOOK: u16 = 4008;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_REQUIRED_FIELD: u16 = 7001;
    pub const VALIDATION_INVALID_INPUT: u16 = 7002;
    pub const VALIDATION_INVALID_DATA: u16 = 7003;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
    pub const OTHER_IO: u16 = 9001;
    pub const OTHER_INTERNAL_ERROR: u16 = 9004;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Invalid TOML in configuration file",
        1003 => "Invalid configuration value",
        1004 => "Invalid backend URL",
        1005 => "Configuration path error",

        2000 => "Generic transport error",
        2001 => "Could not reach backend",
        2002 => "Backend request timed out",
        2003 => "Backend returned a non-success HTTP status",
        2004 => "Backend response could not be decoded",
        2005 => "HTTP client could not be built",

        3000 => "Generic classification error",
        3001 => "Malformed classification response",
        3002 => "Task id not present in the task catalog",
        3003 => "A classification request is already outstanding",

        4000 => "Generic step error",
        4001 => "Step not found in the active runbook",
        4002 => "Step is already executing",
        4003 => "Step has already been attempted",
        4004 => "Step is blocked by an earlier failure",
        4005 => "Step requires explicit approval",
        4006 => "Step is not awaiting approval",
        4007 => "Illegal step state transition",
        4008 => "No runbook is active",

        7000 => "Generic validation error",
        7001 => "Required field missing",
        7002 => "Invalid input",
        7003 => "Invalid data",

        9000 => "Generic error",
        9001 => "I/O error",
        9004 => "Internal error",

        _ => "Unknown error code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_ranges_describe() {
        assert_eq!(
            describe_error_code(ErrorCode::STEP_BLOCKED),
            "Step is blocked by an earlier failure"
        );
        assert_eq!(
            describe_error_code(ErrorCode::TRANSPORT_HTTP_STATUS),
            "Backend returned a non-success HTTP status"
        );
        assert_eq!(describe_error_code(1234), "Unknown error code");
    }
}
