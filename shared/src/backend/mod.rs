//! Collaborator contracts
//!
//! The roster engine is a client of three external services:
//! ```text
//!              ┌──────────────────┐
//!              │  roster engine   │
//!              └───────┬──────────┘
//!        ┌─────────────┼──────────────┐
//!        ▼             ▼              ▼
//!    RowStore      BlobStore     AuthProvider
//!  (rows, rpc)   (photo files)  (identity, role)
//! ```
//! Implementations live next to the engine (in-process) and in the HTTP
//! client crate. Rows travel as JSON; typing happens at the service
//! boundary.

mod auth;
mod blob_store;
mod query;
mod row_store;

pub use auth::AuthProvider;
pub use blob_store::{BlobStore, PutOptions};
pub use query::{Filter, Order, Range, SelectQuery, SelectResult};
pub use row_store::RowStore;

use thiserror::Error;

/// Error reported by a collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection, timeout or other transport failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a failure status
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Missing or expired credentials
    #[error("unauthorized")]
    Unauthorized,

    /// The response could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// The collaborator does not offer this operation
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Decode(err.to_string())
    }
}

/// Result type for collaborator calls
pub type BackendResult<T> = Result<T, BackendError>;
