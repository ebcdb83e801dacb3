//! Shared types for the member roster
//!
//! Common types used by the roster engine and its collaborator clients:
//! member models, the error system, and the row / blob / auth contracts.

pub mod backend;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use backend::{
    AuthProvider, BackendError, BackendResult, BlobStore, Filter, Order, PutOptions, RowStore,
    SelectQuery, SelectResult,
};
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::PaginatedResponse;
