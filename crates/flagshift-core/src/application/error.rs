//! Application layer errors.
//!
//! These errors represent failures in orchestration, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::StepMode;
use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// The flag store could not complete an operation.
    #[error("Flag store error during {operation}: {reason}")]
    Store { operation: String, reason: String },

    /// Store access failed (lock poisoned).
    #[error("Flag store lock poisoned")]
    StoreLockError,

    /// A migration step failed. Steps before it remain applied.
    #[error(
        "Step #{step_id} ({mode} {key}) failed after {applied} applied step(s): {reason}"
    )]
    StepFailed {
        step_id: u32,
        /// Position of the failed step in the plan.
        index: usize,
        mode: StepMode,
        key: String,
        /// Number of steps applied before the failure.
        applied: usize,
        reason: String,
    },

    /// A step referenced a dependency that had not completed.
    #[error("Step #{step_id} depends on step #{dependent_id}, which has not completed")]
    DependencyNotSatisfied { step_id: u32, dependent_id: u32 },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Persisted or supplied data could not be decoded.
    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },
}

impl ApplicationError {
    pub fn store(operation: impl Into<String>, reason: impl ToString) -> Self {
        Self::Store {
            operation: operation.into(),
            reason: reason.to_string(),
        }
    }

    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Store { .. } => vec![
                "Check that the data directory exists and is writable".into(),
                "Run `flagshift config get store.data_dir` to see where flags are kept".into(),
            ],
            Self::StoreLockError => vec![
                "The flag store is locked".into(),
                "Try again in a moment".into(),
            ],
            Self::StepFailed {
                step_id, applied, ..
            } => vec![
                format!("{applied} step(s) before #{step_id} were applied and were not rolled back"),
                "Fix the cause, then re-run `flagshift plan` to see the remaining steps".into(),
            ],
            Self::DependencyNotSatisfied { .. } => vec![
                "Apply plans in the order they were generated".into(),
                "Regenerate the plan with `flagshift plan`".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that the path exists and you have permission to use it".into(),
            ],
            Self::Decode { what, .. } => vec![
                format!("Check that {what} is valid JSON"),
                "Run `flagshift validate <FILE>` for a detailed report".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Store { .. } | Self::StoreLockError => ErrorCategory::Internal,
            Self::FilesystemError { .. } => ErrorCategory::Internal,
            Self::StepFailed { .. } => ErrorCategory::Internal,
            Self::DependencyNotSatisfied { .. } => ErrorCategory::Validation,
            Self::Decode { .. } => ErrorCategory::Validation,
        }
    }
}
