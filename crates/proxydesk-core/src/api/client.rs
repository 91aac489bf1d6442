//! Authorized client for the proxy admin REST API.
//!
//! Every administrative request goes through `AuthorizedClient::execute`,
//! which attaches the session's bearer token and logs the session out when
//! the server answers 401. The client is built once at bootstrap and
//! cloned into the components that need it; clones share the connection
//! pool and the session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::auth::SessionStore;
use crate::models::{
    CredentialRecord, LoginRequest, LoginResponse, NewUser, StatusSnapshot, UsersResponse,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

const LOGIN_PATH: &[&str] = &["api", "admin", "login"];
const USERS_PATH: &[&str] = &["api", "proxy", "users"];
const STATUS_PATH: &[&str] = &["api", "proxy", "status"];

const USERNAME_REQUIRED: &str = "Username is required";

/// Shown when the login endpoint rejects the credentials without saying why
const BAD_CREDENTIALS_MESSAGE: &str = "Bad username or password";

/// API client for the proxy admin service.
/// Clone is cheap - reqwest::Client and the session are both shared.
#[derive(Clone)]
pub struct AuthorizedClient {
    client: Client,
    base_url: Url,
    session: Arc<SessionStore>,
}

impl AuthorizedClient {
    pub fn new(base_url: &str, timeout: Duration, session: Arc<SessionStore>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid admin API URL: {}", base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Admin API URL cannot be used as a base: {}", base_url);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ===== Authorization boundary =====

    /// Send an administrative request with the current bearer token.
    ///
    /// With no token held the request is not sent at all. A 401 invalidates
    /// the token the request carried before the error is returned, so the
    /// session is cleared exactly once per failed request.
    async fn execute(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let Some(token) = self.session.token() else {
            debug!("No session token, request not sent");
            return Err(ApiError::Unauthorized);
        };

        let request = request.bearer_auth(&token).build()?;
        debug!(method = %request.method(), url = %request.url(), "Issuing request");
        let response = self.client.execute(request).await?;
        let status = response.status();
        debug!(%status, url = %response.url(), "Response received");

        if status == StatusCode::UNAUTHORIZED {
            warn!(url = %response.url(), "Authorization failed, ending session");
            self.session.invalidate(&token);
            return Err(ApiError::Unauthorized);
        }

        Self::check_response(response).await
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, body = %ApiError::truncate_body(&body), "Request rejected");
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("{}: {}", e, ApiError::truncate_body(&text)))
        })
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.client.request(method, self.endpoint(segments))
    }

    // ===== Login =====

    /// Exchange admin credentials for a bearer token. This is the one call
    /// that carries no token and whose 401 does not touch the session.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::IncompleteInput("Username and password required"));
        }

        debug!(username, "Issuing login request");
        let response = self
            .request(Method::POST, LOGIN_PATH)
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            let message = ApiError::extract_message(&body)
                .unwrap_or_else(|| BAD_CREDENTIALS_MESSAGE.to_string());
            return Err(ApiError::Validation {
                status: status.as_u16(),
                message: Some(message),
            });
        }

        let response = Self::check_response(response).await?;
        let login: LoginResponse = Self::parse_json(response).await?;
        if login.access_token.is_empty() {
            return Err(ApiError::InvalidResponse("Empty access token".to_string()));
        }
        Ok(login.access_token)
    }

    // ===== Proxy users =====

    pub async fn list_users(&self) -> Result<Vec<CredentialRecord>, ApiError> {
        let response = self.execute(self.request(Method::GET, USERS_PATH)).await?;
        let parsed: UsersResponse = Self::parse_json(response).await?;
        Ok(parsed.users)
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, USERS_PATH).json(user)).await?;
        Ok(())
    }

    /// Delete one user. An empty name would address the collection, so it
    /// is rejected before anything is sent.
    pub async fn delete_user(&self, username: &str) -> Result<(), ApiError> {
        if username.is_empty() {
            return Err(ApiError::IncompleteInput(USERNAME_REQUIRED));
        }
        let path: Vec<&str> = USERS_PATH.iter().copied().chain([username]).collect();
        self.execute(self.request(Method::DELETE, &path)).await?;
        Ok(())
    }

    // ===== Service status =====

    pub async fn fetch_status(&self) -> Result<StatusSnapshot, ApiError> {
        let response = self.execute(self.request(Method::GET, STATUS_PATH)).await?;
        Self::parse_json(response).await
    }
}
