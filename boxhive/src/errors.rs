//! Error types for boxhive operations.
//!
//! The taxonomy mirrors how failures behave, not where they happen:
//!
//! - [`BoxhiveError::Validation`] / [`BoxhiveError::SnapshotNotFound`]:
//!   a precondition or structural invariant failed. Reported synchronously,
//!   nothing was mutated.
//! - [`BoxhiveError::ConfirmationRequired`]: the operation is legal but
//!   risky right now (processes still running). The caller may re-invoke
//!   with explicit confirmation.
//! - [`BoxhiveError::Aborted`]: cooperative cancellation was observed at a
//!   checkpoint before the destructive step.
//! - [`BoxhiveError::Storage`]: a filesystem-level failure, carrying the OS
//!   error code when one is available. Partial mutation may have occurred
//!   and is not rolled back.

use std::path::Path;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type BoxhiveResult<T> = Result<T, BoxhiveError>;

/// Errors produced by box and snapshot operations.
#[derive(Error, Debug)]
pub enum BoxhiveError {
    /// A precondition or structural invariant was violated.
    /// Nothing has been mutated.
    #[error("{0}")]
    Validation(String),

    /// The snapshot named by the caller does not exist in this box.
    #[error("snapshot {0} not found")]
    SnapshotNotFound(String),

    /// The operation is valid but conditionally risky; the caller must
    /// re-invoke with explicit confirmation to proceed.
    #[error("{0}")]
    ConfirmationRequired(String),

    /// Cancellation was requested and observed at a checkpoint.
    #[error("operation aborted by request")]
    Aborted,

    /// A filesystem operation failed. `code` holds the underlying OS error
    /// when one is available.
    #[error("{message}")]
    Storage {
        message: String,
        code: Option<i32>,
    },

    /// The caller-supplied options or a settings document are unusable.
    #[error("config error: {0}")]
    Config(String),

    /// An internal invariant broke; indicates a bug.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BoxhiveError {
    /// Build a `Storage` error without an OS code.
    pub fn storage(message: impl Into<String>) -> Self {
        BoxhiveError::Storage {
            message: message.into(),
            code: None,
        }
    }

    /// Build a `Storage` error from an I/O failure, capturing the OS code.
    pub fn io(message: impl Into<String>, err: &std::io::Error) -> Self {
        BoxhiveError::Storage {
            message: format!("{}: {}", message.into(), err),
            code: err.raw_os_error(),
        }
    }

    /// Build a `Storage` error for a failed operation on one path.
    pub fn io_at(action: &str, path: &Path, err: &std::io::Error) -> Self {
        BoxhiveError::Storage {
            message: format!("{} {}: {}", action, path.display(), err),
            code: err.raw_os_error(),
        }
    }

    /// True for the recoverable "re-invoke with confirmation" class.
    pub fn is_confirmation_required(&self) -> bool {
        matches!(self, BoxhiveError::ConfirmationRequired(_))
    }

    /// True when the operation stopped because cancellation was requested.
    pub fn is_aborted(&self) -> bool {
        matches!(self, BoxhiveError::Aborted)
    }

    /// Underlying OS error code, when this is a storage failure that has one.
    pub fn os_error_code(&self) -> Option<i32> {
        match self {
            BoxhiveError::Storage { code, .. } => *code,
            _ => None,
        }
    }
}
