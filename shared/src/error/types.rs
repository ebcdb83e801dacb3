//! Error types

use super::category::ErrorCategory;
use super::codes::{ErrorCode, Severity};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the only error type that leaves the roster engine:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details (member id, photo url, ...)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Look up a detail entry
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|d| d.get(key))
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Severity of this error
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Whether this error should be surfaced as a warning rather than a failure
    pub fn is_warning(&self) -> bool {
        self.severity() == Severity::Warning
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    /// Create a required field error
    pub fn required(field: &str) -> Self {
        Self::with_message(ErrorCode::RequiredField, format!("{} is required", field))
            .with_detail("field", field)
    }

    /// Create a member not found error
    pub fn member_not_found(id: &str) -> Self {
        Self::with_message(ErrorCode::MemberNotFound, format!("Member {} not found", id))
            .with_detail("member_id", id)
    }

    /// Create a member busy error
    pub fn member_busy(id: &str) -> Self {
        Self::new(ErrorCode::MemberBusy).with_detail("member_id", id)
    }

    /// Create a row store write error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PersistenceError, msg)
    }

    /// Create a row store read error
    pub fn query(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::QueryError, msg)
    }

    /// Create a not authenticated error
    pub fn not_authenticated() -> Self {
        Self::new(ErrorCode::NotAuthenticated)
    }

    /// Create an admin required error
    pub fn admin_required() -> Self {
        Self::new(ErrorCode::AdminRequired)
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::InternalError, msg)
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ConfigError, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::MemberNotFound);
        assert_eq!(err.code, ErrorCode::MemberNotFound);
        assert_eq!(err.message, "Member not found");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "full_name")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.detail("field").unwrap(), "full_name");
        assert_eq!(err.detail("reason").unwrap(), "required");
        assert!(err.detail("missing").is_none());
    }

    #[test]
    fn test_app_error_convenience_constructors() {
        let err = AppError::member_not_found("abc");
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.message, "Member abc not found");
        assert_eq!(err.detail("member_id").unwrap(), "abc");

        let err = AppError::required("gender");
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.message, "gender is required");

        assert_eq!(AppError::persistence("down").category(), ErrorCategory::Persistence);
        assert_eq!(AppError::query("down").category(), ErrorCategory::Query);
        assert_eq!(AppError::admin_required().category(), ErrorCategory::Auth);
        assert_eq!(AppError::member_busy("x").category(), ErrorCategory::Conflict);
    }

    #[test]
    fn test_warning_errors() {
        assert!(AppError::new(ErrorCode::MemberDeleteIncomplete).is_warning());
        assert!(!AppError::persistence("insert failed").is_warning());
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::QueryError, "timeout");
        assert_eq!(format!("{}", err), "timeout");
    }
}
