//! Repository Module
//!
//! Typed access to member rows on top of the generic [`RowStore`] contract.
//! Repository functions decode rows; services decide which error kind a
//! failure becomes.
//!
//! [`RowStore`]: shared::backend::RowStore

pub mod member;

use shared::backend::BackendError;
use shared::error::AppError;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl RepoError {
    /// Failure of a read path
    pub fn into_query_error(self) -> AppError {
        match self {
            RepoError::NotFound(id) => AppError::member_not_found(&id),
            other => AppError::query(other.to_string()),
        }
    }

    /// Failure of a row write
    pub fn into_persistence_error(self) -> AppError {
        match self {
            RepoError::NotFound(id) => AppError::member_not_found(&id),
            other => AppError::persistence(other.to_string()),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCategory;

    #[test]
    fn test_repo_error_mapping() {
        let err = RepoError::Backend(BackendError::Transport("reset".into()));
        assert_eq!(err.into_query_error().category(), ErrorCategory::Query);

        let err = RepoError::Decode("bad row".into());
        assert_eq!(err.into_persistence_error().category(), ErrorCategory::Persistence);

        let err = RepoError::NotFound("m1".into());
        assert_eq!(err.into_persistence_error().category(), ErrorCategory::NotFound);
    }
}
