//! Unified error system for the roster engine
//!
//! This module provides:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by failure kind
//! - [`AppError`]: Rich error type with codes, messages, and details
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Photo / blob storage errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCategory, ErrorCode};
//!
//! let err = AppError::new(ErrorCode::MemberNotFound);
//! assert_eq!(err.category(), ErrorCategory::NotFound);
//!
//! let err = AppError::validation("Full name is required").with_detail("field", "full_name");
//! assert_eq!(err.detail("field").unwrap(), "full_name");
//! ```

mod category;
mod codes;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode, Severity};
pub use types::{AppError, AppResult};
