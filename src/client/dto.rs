//! Request/response bodies of the backend contract

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, ValidationError> {
        let username = username.into();
        let password = password.into();
        if username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username"));
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        Ok(Self { username, password })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: String,
}

/// Account creation request
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Validate the form; the confirmation never leaves the client
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        confirmation: &str,
    ) -> Result<Self, ValidationError> {
        let registration = Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        };

        if registration.username.trim().is_empty() {
            return Err(ValidationError::EmptyField("username"));
        }
        if registration.email.trim().is_empty() {
            return Err(ValidationError::EmptyField("email"));
        }
        if registration.password.is_empty() {
            return Err(ValidationError::EmptyField("password"));
        }
        if registration.password != confirmation {
            return Err(ValidationError::PasswordMismatch);
        }
        Ok(registration)
    }
}

/// The signed-in user's profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Read-only
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Partial profile update; only set fields are sent
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.email.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::NothingToUpdate);
        }
        if matches!(&self.email, Some(email) if email.trim().is_empty()) {
            return Err(ValidationError::EmptyField("email"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GraphqlRequest<'a> {
    pub query: &'a str,
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

/// Raw GraphQL response envelope
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Vec<GraphqlErrorEntry>,
}
