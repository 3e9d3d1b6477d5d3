//! Session error types

use thiserror::Error;

use crate::client::{ClientError, ValidationError};

/// Errors raised by the session store and token persistence
#[derive(Error, Debug)]
pub enum SessionError {
    /// Reading or writing the session file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Session file could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A protected operation was attempted without a stored token
    #[error("Not logged in; run `ecocat login <username>` first")]
    NotAuthenticated,

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}

impl SessionError {
    /// Whether the failure ended the session
    pub fn is_unauthorized(&self) -> bool {
        match self {
            SessionError::NotAuthenticated => true,
            SessionError::Client(e) => e.is_unauthorized(),
            _ => false,
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_classification() {
        assert!(SessionError::NotAuthenticated.is_unauthorized());
        let err: SessionError = ClientError::from_status(403, "").into();
        assert!(err.is_unauthorized());
        let err: SessionError = ClientError::Timeout.into();
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: SessionError = ClientError::Timeout.into();
        assert_eq!(err.to_string(), "Request timeout");
    }
}
