//! Backend client error types

use thiserror::Error;

/// Errors that can occur when talking to the catalogue backend
#[derive(Error, Debug)]
pub enum ClientError {
    /// Backend could not be reached
    #[error("Catalogue backend unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    /// 401 or 403: the stored token is missing, expired or revoked
    #[error("Not authorized (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ClientError {
    /// Whether this error must tear down the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    /// Map a non-success status and its body text to an error
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        match status {
            401 | 403 => ClientError::Unauthorized { status, message },
            404 => ClientError::NotFound(message),
            _ => ClientError::Api { status, message },
        }
    }
}

/// Pull a readable message out of an error body
///
/// Accepts `{"detail": "..."}`, `{"non_field_errors": ["..."]}`, a bare JSON
/// string, or falls back to the raw text.
pub fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(s)) => s,
        Ok(serde_json::Value::Object(map)) => {
            if let Some(detail) = map.get("detail").and_then(|v| v.as_str()) {
                return detail.to_string();
            }
            if let Some(first) = map
                .get("non_field_errors")
                .and_then(|v| v.as_array())
                .and_then(|a| a.first())
                .and_then(|v| v.as_str())
            {
                return first.to_string();
            }
            trimmed.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Result type alias for backend calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Input rejected before any network call
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("Nothing to update")]
    NothingToUpdate,
}
