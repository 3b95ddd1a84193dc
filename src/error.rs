//! Exit codes and structured error output for the command-line tool.

use serde::Serialize;

/// Exit codes for apod-cache.
///
/// - 0: Success
/// - 1: General error (storage, I/O, bad input)
/// - 2: Not found (no entry with the requested id)
/// - 3: Verification found damaged entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The command completed normally.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The requested entry does not exist.
    NotFound = 2,
    /// `verify` found missing or modified files.
    VerifyFailed = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "AC000",
            Self::GeneralError => "AC001",
            Self::NotFound => "AC002",
            Self::VerifyFailed => "AC003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "AC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
