//! Unified error codes for the roster engine
//!
//! Error codes are organized by range:
//! - 0xxx: General errors (validation, format, lookup)
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Photo / blob storage errors
//! - 9xxx: System errors (row store, queries, configuration)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so they survive
/// serialization to any front end unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,

    // ==================== 2xxx: Permission ====================
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Member ====================
    /// Member not found (stale id)
    MemberNotFound = 3001,
    /// Another mutation on the same member is still in flight
    MemberBusy = 3002,
    /// Birth date could not be parsed
    InvalidBirthDate = 3003,
    /// Phone number is not digits-only
    InvalidPhone = 3004,

    // ==================== 4xxx: Photo ====================
    /// Photo upload failed
    PhotoUploadFailed = 4002,
    /// Photo exceeds the size limit
    PhotoTooLarge = 4003,
    /// Photo extension or content is not a supported image
    UnsupportedPhotoFormat = 4004,

    // ==================== 9xxx: System ====================
    /// Internal error
    InternalError = 9001,
    /// Row store write failed
    PersistenceError = 9002,
    /// Row store read failed
    QueryError = 9003,
    /// Row delete failed after the photo was already removed
    MemberDeleteIncomplete = 9004,
    /// Configuration is invalid
    ConfigError = 9005,
}

/// Severity of an error as surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Severity used when the error is surfaced
    pub const fn severity(&self) -> Severity {
        match self {
            ErrorCode::MemberDeleteIncomplete | ErrorCode::MemberBusy => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",

            // Permission
            ErrorCode::AdminRequired => "Administrator role is required",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberBusy => "Another change to this member is in progress",
            ErrorCode::InvalidBirthDate => "Birth date is not a valid date",
            ErrorCode::InvalidPhone => "Phone number must contain digits only",

            // Photo
            ErrorCode::PhotoUploadFailed => "Photo upload failed",
            ErrorCode::PhotoTooLarge => "Photo is too large",
            ErrorCode::UnsupportedPhotoFormat => "Unsupported photo format",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::PersistenceError => "Failed to save member data",
            ErrorCode::QueryError => "Failed to load member data",
            ErrorCode::MemberDeleteIncomplete => {
                "Member photo was removed but the record could not be deleted"
            }
            ErrorCode::ConfigError => "Invalid configuration",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown u16 into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),

            // Permission
            2003 => Ok(ErrorCode::AdminRequired),

            // Member
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::MemberBusy),
            3003 => Ok(ErrorCode::InvalidBirthDate),
            3004 => Ok(ErrorCode::InvalidPhone),

            // Photo
            4002 => Ok(ErrorCode::PhotoUploadFailed),
            4003 => Ok(ErrorCode::PhotoTooLarge),
            4004 => Ok(ErrorCode::UnsupportedPhotoFormat),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::PersistenceError),
            9003 => Ok(ErrorCode::QueryError),
            9004 => Ok(ErrorCode::MemberDeleteIncomplete),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::AdminRequired.code(), 2003);
        assert_eq!(ErrorCode::MemberNotFound.code(), 3001);
        assert_eq!(ErrorCode::PhotoUploadFailed.code(), 4002);
        assert_eq!(ErrorCode::QueryError.code(), 9003);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(2), Ok(ErrorCode::ValidationFailed));
        assert_eq!(ErrorCode::try_from(3002), Ok(ErrorCode::MemberBusy));
        assert_eq!(ErrorCode::try_from(9004), Ok(ErrorCode::MemberDeleteIncomplete));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(4), Err(InvalidErrorCode(4)));
        assert_eq!(ErrorCode::try_from(0), Err(InvalidErrorCode(0)));
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::PersistenceError).unwrap();
        assert_eq!(json, "9002");
        let parsed: ErrorCode = serde_json::from_str("3001").unwrap();
        assert_eq!(parsed, ErrorCode::MemberNotFound);
        assert!(serde_json::from_str::<ErrorCode>("1234").is_err());
    }

    #[test]
    fn test_severity() {
        assert_eq!(ErrorCode::MemberDeleteIncomplete.severity(), Severity::Warning);
        assert_eq!(ErrorCode::PersistenceError.severity(), Severity::Error);
        assert_eq!(ErrorCode::QueryError.severity(), Severity::Error);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::ValidationFailed), "2");
        assert_eq!(format!("{}", ErrorCode::InternalError), "9001");
        assert_eq!(format!("{}", InvalidErrorCode(999)), "invalid error code: 999");
    }
}
