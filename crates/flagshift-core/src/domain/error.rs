// ============================================================================
// domain/error.rs - FLAG DOMAIN ERRORS
// ============================================================================

use thiserror::Error;

use crate::domain::value_objects::FlagKind;

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (for retry logic)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Input Validation Errors (400-level equivalent)
    // ========================================================================
    #[error("invalid flag key '{key}': {reason}")]
    InvalidFlagKey { key: String, reason: String },

    #[error("invalid schema for flag '{key}': {reason}")]
    InvalidSchema { key: String, reason: String },

    #[error("invalid value for flag '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("invalid environment '{environment}': {reason}")]
    InvalidEnvironment { environment: String, reason: String },

    #[error("unknown flag type '{0}'")]
    UnknownFlagKind(String),

    // ========================================================================
    // Usage Errors
    // ========================================================================
    #[error("cannot merge a {override_kind} flag onto a {current} flag")]
    TypeMismatch {
        current: FlagKind,
        override_kind: FlagKind,
    },

    // ========================================================================
    // Not Found / Conflict Errors
    // ========================================================================
    #[error("flag '{key}' not found in environment '{environment}'")]
    FlagNotFound { environment: String, key: String },

    #[error("flag '{key}' already exists in environment '{environment}'")]
    FlagExists { environment: String, key: String },
}

impl DomainError {
    /// The flag key this error is about, when there is one.
    pub fn flag_key(&self) -> Option<&str> {
        match self {
            Self::InvalidFlagKey { key, .. }
            | Self::InvalidSchema { key, .. }
            | Self::InvalidValue { key, .. }
            | Self::FlagNotFound { key, .. }
            | Self::FlagExists { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFlagKey { key, .. } => vec![
                format!("Rename '{}' to a valid hierarchical key", key),
                "Keys are segments of letters, digits, '_' or '-' joined by '/'".into(),
                "Example: checkout/payment/new-flow".into(),
            ],
            Self::InvalidSchema { key, reason } => vec![
                format!("Fix the constraints of '{}': {}", key, reason),
                "The default value must satisfy the flag's own constraints".into(),
            ],
            Self::InvalidValue { key, reason } => vec![
                format!("Fix the stored value of '{}': {}", key, reason),
                "Remove \"value\" and set \"valueExists\": false to fall back to the default"
                    .into(),
            ],
            Self::InvalidVersion { .. } => vec![
                "Versions use MAJOR.MINOR.PATCH, e.g. 1.4.0".into(),
            ],
            Self::UnknownFlagKind(_) => vec![
                "Supported types: BOOLEAN, INTEGER, STRING, ENUM, TAG, AB-TEST".into(),
            ],
            Self::FlagNotFound { environment, .. } => vec![
                format!("List flags with: flagshift list --env {}", environment),
            ],
            Self::FlagExists { key, .. } => vec![
                format!("Update '{}' instead of creating it", key),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFlagKey { .. }
            | Self::InvalidSchema { .. }
            | Self::InvalidValue { .. }
            | Self::InvalidVersion { .. }
            | Self::InvalidEnvironment { .. }
            | Self::UnknownFlagKind(_) => ErrorCategory::Validation,
            Self::FlagExists { .. } => ErrorCategory::Conflict,
            Self::FlagNotFound { .. } => ErrorCategory::NotFound,
            Self::TypeMismatch { .. } => ErrorCategory::Internal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Conflict,
    NotFound,
    Internal,
}
