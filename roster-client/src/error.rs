//! Client error types

use shared::backend::BackendError;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request rejected by the server
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client could not be constructed
    #[error("Client setup error: {0}")]
    Setup(String),
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for BackendError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) if e.is_decode() => BackendError::Decode(e.to_string()),
            ClientError::Http(e) => BackendError::Transport(e.to_string()),
            ClientError::Setup(msg) => BackendError::Transport(msg),
            ClientError::Unauthorized => BackendError::Unauthorized,
            ClientError::Forbidden(message) => BackendError::Rejected {
                status: 403,
                message,
            },
            ClientError::NotFound(message) => BackendError::Rejected {
                status: 404,
                message,
            },
            ClientError::Rejected { status, message } => BackendError::Rejected { status, message },
            ClientError::InvalidResponse(msg) => BackendError::Decode(msg),
            ClientError::Serialization(e) => BackendError::Decode(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_backend_error() {
        assert_eq!(BackendError::from(ClientError::Unauthorized), BackendError::Unauthorized);
        assert!(matches!(
            BackendError::from(ClientError::NotFound("x".into())),
            BackendError::Rejected { status: 404, .. }
        ));
        assert!(matches!(
            BackendError::from(ClientError::InvalidResponse("x".into())),
            BackendError::Decode(_)
        ));
    }
}
