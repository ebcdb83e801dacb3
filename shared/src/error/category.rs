//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category: the kind of failure as seen by the roster, independent
/// of the concrete code.
///
/// | Category | Surfaced as | Effect on roster state |
/// |----------|-------------|------------------------|
/// | Validation | inline message | none |
/// | Format | inline message (submit) / sentinel (display) | none |
/// | Storage | message | row untouched |
/// | Persistence | message | may leave an orphaned photo |
/// | Query | banner | last good page kept |
/// | NotFound | message | triggers refresh |
/// | Auth | redirect to login / unauthorized | none |
/// | Conflict | disabled control | none |
/// | System | message | none |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    Format,
    Storage,
    Persistence,
    Query,
    NotFound,
    Auth,
    Conflict,
    System,
}

impl ErrorCategory {
    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Format => "format",
            Self::Storage => "storage",
            Self::Persistence => "persistence",
            Self::Query => "query",
            Self::NotFound => "not_found",
            Self::Auth => "auth",
            Self::Conflict => "conflict",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidRequest
            | ErrorCode::RequiredField
            | ErrorCode::ValueOutOfRange
            | ErrorCode::InvalidPhone
            | ErrorCode::PhotoTooLarge
            | ErrorCode::UnsupportedPhotoFormat => ErrorCategory::Validation,

            ErrorCode::InvalidBirthDate => ErrorCategory::Format,

            ErrorCode::PhotoUploadFailed => ErrorCategory::Storage,

            ErrorCode::PersistenceError | ErrorCode::MemberDeleteIncomplete => {
                ErrorCategory::Persistence
            }

            ErrorCode::QueryError => ErrorCategory::Query,

            ErrorCode::MemberNotFound => ErrorCategory::NotFound,

            ErrorCode::NotAuthenticated
            | ErrorCode::InvalidCredentials
            | ErrorCode::AdminRequired => ErrorCategory::Auth,

            ErrorCode::MemberBusy => ErrorCategory::Conflict,

            ErrorCode::InternalError | ErrorCode::ConfigError => ErrorCategory::System,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
