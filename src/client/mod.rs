//! Catalogue backend client
//!
//! Typed access to the REST and GraphQL endpoints. Authenticated calls take
//! the session token explicitly and send it as `Authorization: <scheme>
//! <token>`. [`CatalogBackend`] is the seam the session store talks through.

pub mod dto;
pub mod error;

pub use dto::{Credentials, GraphqlErrorEntry, GraphqlResponse, ProfileUpdate, Registration, UserProfile};
pub use error::{extract_message, ClientError, ClientResult, ValidationError};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::catalog::DatasetRecord;
use dto::{GraphqlRequest, TokenResponse};

/// Default backend address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";

/// Default authorization scheme
pub const DEFAULT_AUTH_SCHEME: &str = "Token";

/// Backend client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Prefix of the Authorization header value
    pub auth_scheme: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Operations of the backend contract
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Exchange credentials for a token
    async fn obtain_token(&self, credentials: &Credentials) -> ClientResult<String>;

    async fn register(&self, registration: &Registration) -> ClientResult<()>;

    async fn list_datasets(&self, token: &str) -> ClientResult<Vec<DatasetRecord>>;

    async fn get_dataset(&self, token: &str, id: i64) -> ClientResult<DatasetRecord>;

    async fn get_profile(&self, token: &str) -> ClientResult<UserProfile>;

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ClientResult<()>;

    /// Run a GraphQL document; remote `errors` are returned in the envelope
    async fn graphql(&self, token: &str, query: &str) -> ClientResult<GraphqlResponse>;
}

/// reqwest implementation of [`CatalogBackend`]
pub struct CatalogClient {
    client: Client,
    config: ClientConfig,
}

impl CatalogClient {
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL of an endpoint path such as `api/donnees/`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match token {
            Some(token) => builder.header(
                reqwest::header::AUTHORIZATION,
                format!("{} {}", self.config.auth_scheme, token),
            ),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Response> {
        builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else if e.is_connect() {
                ClientError::Unavailable
            } else {
                ClientError::Request(e)
            }
        })
    }

    /// Send, map non-success statuses, return the body text
    async fn execute(&self, method: Method, path: &str, builder: RequestBuilder) -> ClientResult<String> {
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(%method, path, status = status.as_u16(), bytes = body.len(), "Backend call");

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::from_status(status.as_u16(), &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, token: &str) -> ClientResult<T> {
        let builder = self.request(Method::GET, path, Some(token));
        let body = self.execute(Method::GET, path, builder).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CatalogBackend for CatalogClient {
    async fn obtain_token(&self, credentials: &Credentials) -> ClientResult<String> {
        let path = "api/token-auth/";
        let builder = self.request(Method::POST, path, None).json(credentials);
        let body = self.execute(Method::POST, path, builder).await?;
        let response: TokenResponse = serde_json::from_str(&body)?;
        Ok(response.token)
    }

    async fn register(&self, registration: &Registration) -> ClientResult<()> {
        let path = "api/register/";
        let builder = self.request(Method::POST, path, None).json(registration);
        self.execute(Method::POST, path, builder).await?;
        Ok(())
    }

    async fn list_datasets(&self, token: &str) -> ClientResult<Vec<DatasetRecord>> {
        self.get_json("api/donnees/", token).await
    }

    async fn get_dataset(&self, token: &str, id: i64) -> ClientResult<DatasetRecord> {
        self.get_json(&format!("api/donnees/{}/", id), token).await
    }

    async fn get_profile(&self, token: &str) -> ClientResult<UserProfile> {
        self.get_json("api/me/", token).await
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ClientResult<()> {
        let path = "api/me/";
        let builder = self.request(Method::PATCH, path, Some(token)).json(update);
        self.execute(Method::PATCH, path, builder).await?;
        Ok(())
    }

    async fn graphql(&self, token: &str, query: &str) -> ClientResult<GraphqlResponse> {
        let path = "graphql/";
        let builder = self
            .request(Method::POST, path, Some(token))
            .json(&GraphqlRequest { query });

        let response = self.send(builder).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(method = "POST", path, status, bytes = body.len(), "Backend call");

        // Validation failures come back as 400 with a regular errors envelope
        if status == 400 {
            if let Ok(envelope) = serde_json::from_str::<GraphqlResponse>(&body) {
                if !envelope.errors.is_empty() {
                    return Ok(envelope);
                }
            }
        }
        if !(200..300).contains(&status) {
            return Err(ClientError::from_status(status, &body));
        }
        Ok(serde_json::from_str(&body)?)
    }
}
