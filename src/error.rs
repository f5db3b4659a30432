//! Structured error handling and exit codes.

use serde::Serialize;

use crate::coordinator::CoordinatorError;
use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Completed, duplicates found
/// - 1: General error
/// - 2: Completed, no duplicates found
/// - 3: Completed, but some entries could not be read, hashed, or deleted
/// - 130: Interrupted by the user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed and found duplicates (or deleted everything requested).
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Completed but found no duplicates.
    NoDuplicates = 2,
    /// Completed with non-fatal failures.
    PartialSuccess = 3,
    /// Cancelled by the user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code used in JSON error output.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for an error that ended the run.
    ///
    /// Cancellation anywhere in the chain maps to `Interrupted`.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        let cancelled = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<CoordinatorError>(),
                Some(CoordinatorError::Cancelled)
            ) || matches!(
                cause.downcast_ref::<FinderError>(),
                Some(FinderError::Interrupted)
            )
        });
        if cancelled {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g. "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the run was cancelled
    pub interrupted: bool,
}

impl StructuredError {
    /// Build a report for `err` exiting with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
