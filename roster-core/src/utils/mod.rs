//! Utility module
//!
//! - [`time`] - display/storage date conversion and age computation
//! - [`logger`] - tracing subscriber setup

pub mod logger;
pub mod time;

// Re-export error types from shared
pub use shared::error::{AppError, AppResult, ErrorCategory, ErrorCode};
