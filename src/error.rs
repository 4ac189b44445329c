//! Structured error handling and exit codes.

use serde::Serialize;
use thiserror::Error;

use crate::session::Operation;

/// Exit codes for the imagesweep application.
///
/// - 0: Success (completed normally, duplicates found or deletions done)
/// - 1: General error (unexpected failure)
/// - 2: No duplicates found (completed normally, nothing to review)
/// - 3: Partial success (a deletion reported some failed files)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Deletion completed but some files could not be removed.
    PartialSuccess = 3,
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
            Self::Success => "IS000",
            Self::GeneralError => "IS001",
            Self::NoDuplicates => "IS002",
            Self::PartialSuccess => "IS003",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "IS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        let message = err
            .downcast_ref::<SessionError>()
            .map_or_else(|| err.to_string(), SessionError::user_message);

        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message,
        }
    }
}

/// Failures surfaced by the scan session.
///
/// Every variant leaves the session untouched: a failed request commits
/// none of its effects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A scan was requested without a folder.
    #[error("no folder selected for scanning")]
    MissingFolder,

    /// The similarity threshold is outside `[0, 1]`.
    #[error("similarity threshold {0} is outside [0, 1]")]
    InvalidThreshold(f64),

    /// A deletion was requested with nothing selected.
    #[error("no images selected for deletion")]
    EmptySelection,

    /// The scan service failed or answered with an error payload.
    #[error("scan failed: {}", message.as_deref().unwrap_or("unknown error"))]
    ScanService {
        /// Message provided by the service, if any.
        message: Option<String>,
    },

    /// The delete service could not be reached or failed outright.
    #[error("delete service unavailable: {message}")]
    DeleteServiceUnavailable {
        /// Underlying failure.
        message: String,
    },

    /// Another scan or delete is still outstanding.
    #[error("a {0} is already in progress")]
    OperationInFlight(Operation),

    /// The session's results are exhausted; a new scan must be requested first.
    #[error("session results are exhausted; request a new scan first")]
    SessionExhausted,

    /// A delete was requested before any scan produced findings.
    #[error("no scan results to delete from")]
    NoScanResults,
}

impl SessionError {
    /// Message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingFolder => "Please select a folder first!".to_string(),
            Self::InvalidThreshold(value) => {
                format!("Scan threshold must be between 0 and 1 (got {value}).")
            }
            Self::EmptySelection => "No images selected for deletion".to_string(),
            Self::ScanService {
                message: Some(message),
            } => format!("Error: {message}"),
            Self::ScanService { message: None } => {
                "An error occurred during scanning.".to_string()
            }
            Self::DeleteServiceUnavailable { .. } => {
                "An error occurred while deleting images.".to_string()
            }
            Self::OperationInFlight(op) => format!("Please wait for the current {op} to finish."),
            Self::SessionExhausted => {
                "Processing completed! Start a new scan to continue.".to_string()
            }
            Self::NoScanResults => "Please scan a folder first!".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NoDuplicates.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::PartialSuccess.code_prefix(), "IS003");
    }

    #[test]
    fn test_scan_error_user_message() {
        let with_message = SessionError::ScanService {
            message: Some("Folder 'x' is empty".into()),
        };
        assert_eq!(with_message.user_message(), "Error: Folder 'x' is empty");

        let generic = SessionError::ScanService { message: None };
        assert_eq!(generic.user_message(), "An error occurred during scanning.");
    }

    #[test]
    fn test_no_scan_results_user_message() {
        assert_eq!(
            SessionError::NoScanResults.user_message(),
            "Please scan a folder first!"
        );
    }

    #[test]
    fn test_structured_error_uses_user_message() {
        let err = anyhow::Error::new(SessionError::MissingFolder);
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.code, "IS001");
        assert_eq!(structured.message, "Please select a folder first!");
    }

    #[test]
    fn test_structured_error_plain() {
        let err = anyhow::anyhow!("boom");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        assert_eq!(structured.message, "boom");
        assert_eq!(structured.exit_code, 1);
    }
}
