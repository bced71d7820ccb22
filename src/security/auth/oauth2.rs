//! OAuth 2.0 client-credentials authentication
//!
//! Tokens are requested with a form POST to `token_url`. The token state sits
//! behind one async mutex that is held across the HTTP exchange, so concurrent
//! callers share a single token request instead of racing.

use super::{AuthParams, AuthProvider};
use crate::config::{secret_string, SecretString};
use crate::domain::{AuthType, Credentials, GatewayError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;

/// Lifetime assumed when the token response carries no `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

/// Longest token lifetime honoured; larger `expires_in` values are clamped
pub const MAX_EXPIRES_IN_SECS: u64 = 10 * 365 * 24 * 3600;

const TOKEN_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<SecretString>,
    refresh_token: Option<SecretString>,
    token_type: String,
    expires_in: u64,
    issued_at: Option<DateTime<Utc>>,
}

impl TokenState {
    fn lifetime(&self) -> ChronoDuration {
        ChronoDuration::seconds(self.expires_in.min(MAX_EXPIRES_IN_SECS) as i64)
    }

    fn is_expired(&self) -> bool {
        match self.issued_at {
            Some(issued_at) => Utc::now() - issued_at >= self.lifetime(),
            None => true,
        }
    }

    fn credentials(&self) -> Option<Credentials> {
        let token = self.access_token.as_ref()?;
        let issued_at = self.issued_at?;
        Some(Credentials::oauth2(
            token.expose_secret().as_ref().to_string(),
            self.token_type.clone(),
            issued_at,
            Some(issued_at + self.lifetime()),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Client-credentials grant with refresh-token renewal
#[derive(Debug)]
pub struct OAuth2Provider {
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    scope: Option<String>,
    client: Client,
    state: Mutex<TokenState>,
}

impl OAuth2Provider {
    /// Requires `token_url`, `client_id` and `client_secret`; `scope` is optional
    pub fn new(params: &AuthParams) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(TOKEN_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| GatewayError::Auth(format!("Failed to build HTTP client: {e}")))?;
        Self::with_client(params, client)
    }

    /// Same as [`new`](Self::new) with a caller-supplied HTTP client
    pub fn with_client(params: &AuthParams, client: Client) -> Result<Self> {
        let token_url = params.require("token_url", AuthType::OAuth2)?.to_string();
        let client_id = params.require("client_id", AuthType::OAuth2)?.to_string();
        let client_secret =
            secret_string(params.require("client_secret", AuthType::OAuth2)?.to_string());
        let scope = params
            .get("scope")
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string);

        Ok(Self {
            token_url,
            client_id,
            client_secret,
            scope,
            client,
            state: Mutex::new(TokenState::default()),
        })
    }

    async fn request_token(&self, form: &[(&str, &str)], action: &str) -> Result<TokenResponse> {
        tracing::debug!(
            token_url = %self.token_url,
            client_id = %self.client_id,
            action,
            "Requesting OAuth2 token"
        );

        let response = self
            .client
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| GatewayError::Auth(format!("OAuth2 {action} request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Auth(format!(
                "OAuth2 {action} failed with status {status}: {error_text}"
            )));
        }

        response.json().await.map_err(|e| {
            GatewayError::Auth(format!("Failed to parse OAuth2 {action} response: {e}"))
        })
    }

    fn store(state: &mut TokenState, response: TokenResponse) -> Result<Credentials> {
        state.access_token = Some(secret_string(response.access_token));
        if let Some(refresh_token) = response.refresh_token {
            state.refresh_token = Some(secret_string(refresh_token));
        }
        state.token_type = response.token_type.unwrap_or_else(|| "Bearer".to_string());
        let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        if expires_in > MAX_EXPIRES_IN_SECS {
            tracing::warn!(expires_in, max = MAX_EXPIRES_IN_SECS, "Clamping OAuth2 token lifetime");
        }
        state.expires_in = expires_in.min(MAX_EXPIRES_IN_SECS);
        state.issued_at = Some(Utc::now());

        tracing::info!(
            expires_in = state.expires_in,
            has_refresh_token = state.refresh_token.is_some(),
            "OAuth2 access token acquired"
        );

        state
            .credentials()
            .ok_or_else(|| GatewayError::Auth("OAuth2 token state incomplete".to_string()))
    }

    async fn authenticate_locked(&self, state: &mut TokenState) -> Result<Credentials> {
        let secret = self.client_secret.expose_secret();
        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", secret.as_ref()),
        ];
        if let Some(scope) = &self.scope {
            form.push(("scope", scope.as_str()));
        }

        let response = self.request_token(&form, "token").await?;
        Self::store(state, response)
    }

    async fn refresh_locked(&self, state: &mut TokenState) -> Result<Credentials> {
        let Some(refresh_token) = state.refresh_token.clone() else {
            return self.authenticate_locked(state).await;
        };

        let secret = self.client_secret.expose_secret();
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret().as_ref()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", secret.as_ref()),
        ];

        match self.request_token(&form, "refresh").await {
            Ok(response) => Self::store(state, response),
            Err(e) => {
                tracing::warn!(error = %e, "OAuth2 refresh failed, re-authenticating");
                state.refresh_token = None;
                self.authenticate_locked(state).await
            }
        }
    }
}

#[async_trait]
impl AuthProvider for OAuth2Provider {
    fn auth_type(&self) -> AuthType {
        AuthType::OAuth2
    }

    async fn authenticate(&self) -> Result<Credentials> {
        let mut state = self.state.lock().await;
        self.authenticate_locked(&mut state).await
    }

    async fn refresh(&self) -> Result<Credentials> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn get_credentials(&self) -> Result<Credentials> {
        let mut state = self.state.lock().await;

        if state.access_token.is_none() {
            return self.authenticate_locked(&mut state).await;
        }

        if state.is_expired() {
            tracing::debug!(token_url = %self.token_url, "OAuth2 token expired, refreshing");
            return self.refresh_locked(&mut state).await;
        }

        state
            .credentials()
            .ok_or_else(|| GatewayError::Auth("OAuth2 token state incomplete".to_string()))
    }

    async fn revoke(&self) -> Result<()> {
        *self.state.lock().await = TokenState::default();
        Ok(())
    }

    async fn is_expired(&self) -> bool {
        self.state.lock().await.is_expired()
    }
}
