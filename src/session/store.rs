//! Application state store
//!
//! Two slices, auth and data, each written only by [`AppStore::dispatch`].
//! Readers hold `watch` receivers and never mutate. Backend calls go through
//! the store so that any 401/403 tears the session down no matter which
//! command issued the call.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::error::{SessionError, SessionResult};
use super::token_store::{StoredSession, TokenStore};
use crate::catalog::DatasetRecord;
use crate::client::{
    CatalogBackend, ClientResult, Credentials, GraphqlResponse, ProfileUpdate, Registration,
    UserProfile,
};

/// Authentication slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Dataset slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataState {
    pub items: Vec<DatasetRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub fetched_at: Option<DateTime<Utc>>,
}

/// State transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoginSucceeded { token: String, user: String },
    Logout,
    FetchStarted,
    FetchFulfilled(Vec<DatasetRecord>),
    FetchRejected(String),
}

/// Owner of the auth and data slices
pub struct AppStore {
    backend: Arc<dyn CatalogBackend>,
    tokens: TokenStore,
    auth_tx: watch::Sender<AuthState>,
    data_tx: watch::Sender<DataState>,
}

impl AppStore {
    /// Create a store, restoring any persisted session
    pub fn new(backend: Arc<dyn CatalogBackend>, tokens: TokenStore) -> Self {
        let initial = tokens
            .load()
            .map(|session| AuthState {
                token: Some(session.token),
                user: Some(session.user),
            })
            .unwrap_or_default();

        debug!(authenticated = initial.is_authenticated(), "Session restored");

        let (auth_tx, _) = watch::channel(initial);
        let (data_tx, _) = watch::channel(DataState::default());

        Self {
            backend,
            tokens,
            auth_tx,
            data_tx,
        }
    }

    /// Read-only view of the auth slice
    pub fn auth(&self) -> watch::Receiver<AuthState> {
        self.auth_tx.subscribe()
    }

    /// Read-only view of the data slice
    pub fn data(&self) -> watch::Receiver<DataState> {
        self.data_tx.subscribe()
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth_tx.borrow().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth_tx.borrow().is_authenticated()
    }

    /// Apply an action to its slice
    ///
    /// Login persists the session before updating the slice. Logout always
    /// updates the slice, even when deleting the session file fails.
    pub fn dispatch(&self, action: Action) -> SessionResult<()> {
        match action {
            Action::LoginSucceeded { token, user } => {
                self.tokens.save(&StoredSession::new(token.clone(), user.clone()))?;
                self.auth_tx.send_replace(AuthState {
                    token: Some(token),
                    user: Some(user),
                });
                Ok(())
            }
            Action::Logout => {
                self.auth_tx.send_replace(AuthState::default());
                self.tokens.clear()
            }
            Action::FetchStarted => {
                self.data_tx.send_modify(|data| {
                    data.loading = true;
                    data.error = None;
                });
                Ok(())
            }
            Action::FetchFulfilled(items) => {
                self.data_tx.send_modify(|data| {
                    data.loading = false;
                    data.items = items;
                    data.fetched_at = Some(Utc::now());
                });
                Ok(())
            }
            Action::FetchRejected(message) => {
                self.data_tx.send_modify(|data| {
                    data.loading = false;
                    data.error = Some(message);
                });
                Ok(())
            }
        }
    }

    fn token(&self) -> SessionResult<String> {
        self.auth_tx
            .borrow()
            .token
            .clone()
            .ok_or(SessionError::NotAuthenticated)
    }

    /// Pass a backend result through, ending the session on 401/403
    fn guard<T>(&self, result: ClientResult<T>) -> SessionResult<T> {
        match result {
            Ok(value) => Ok(value),
            Err(e) if e.is_unauthorized() => {
                warn!(error = %e, "Backend rejected credentials; logging out");
                if let Err(clear_err) = self.dispatch(Action::Logout) {
                    warn!(error = %clear_err, "Failed to remove session file");
                }
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Authenticate and persist the session
    pub async fn login(&self, credentials: &Credentials) -> SessionResult<()> {
        let token = self.backend.obtain_token(credentials).await?;
        self.dispatch(Action::LoginSucceeded {
            token,
            user: credentials.username.clone(),
        })?;
        info!(user = %credentials.username, "Logged in");
        Ok(())
    }

    pub fn logout(&self) -> SessionResult<()> {
        let user = self.auth_tx.borrow().user.clone();
        self.dispatch(Action::Logout)?;
        info!(user = ?user, "Logged out");
        Ok(())
    }

    /// Create an account; does not log in
    pub async fn register(&self, registration: &Registration) -> SessionResult<()> {
        self.backend.register(registration).await?;
        info!(user = %registration.username, "Account created");
        Ok(())
    }

    /// Fetch the full catalogue into the data slice
    pub async fn fetch_datasets(&self) -> SessionResult<Vec<DatasetRecord>> {
        let token = self.token()?;
        self.dispatch(Action::FetchStarted)?;

        let result = self.backend.list_datasets(&token).await;
        match self.guard(result) {
            Ok(items) => {
                debug!(count = items.len(), "Datasets fetched");
                self.dispatch(Action::FetchFulfilled(items.clone()))?;
                Ok(items)
            }
            Err(e) => {
                self.dispatch(Action::FetchRejected(e.to_string()))?;
                Err(e)
            }
        }
    }

    pub async fn fetch_dataset(&self, id: i64) -> SessionResult<DatasetRecord> {
        let token = self.token()?;
        let result = self.backend.get_dataset(&token, id).await;
        self.guard(result)
    }

    pub async fn profile(&self) -> SessionResult<UserProfile> {
        let token = self.token()?;
        let result = self.backend.get_profile(&token).await;
        self.guard(result)
    }

    /// Validate then send a partial profile update
    pub async fn update_profile(&self, update: &ProfileUpdate) -> SessionResult<()> {
        update.validate()?;
        let token = self.token()?;
        let result = self.backend.update_profile(&token, update).await;
        self.guard(result)
    }

    pub async fn graphql(&self, query: &str) -> SessionResult<GraphqlResponse> {
        let token = self.token()?;
        let result = self.backend.graphql(&token, query).await;
        self.guard(result)
    }
}
