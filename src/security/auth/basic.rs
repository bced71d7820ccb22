//! HTTP Basic authentication

use super::{AuthParams, AuthProvider};
use crate::config::SecretString;
use crate::domain::{AuthType, Credentials, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::ExposeSecret;
use tokio::sync::Mutex;

/// Base64 `username:password` credentials that never expire
#[derive(Debug)]
pub struct BasicAuthProvider {
    username: String,
    password: SecretString,
    cached: Mutex<Option<Credentials>>,
}

impl BasicAuthProvider {
    /// Requires `username` and `password`
    pub fn new(params: &AuthParams) -> Result<Self> {
        let username = params.require("username", AuthType::Basic)?.to_string();
        let password = crate::config::secret_string(
            params.require("password", AuthType::Basic)?.to_string(),
        );

        Ok(Self {
            username,
            password,
            cached: Mutex::new(None),
        })
    }

    fn encode(&self) -> Credentials {
        let pair = format!("{}:{}", self.username, self.password.expose_secret().as_ref());
        Credentials::basic(BASE64.encode(pair))
    }
}

#[async_trait]
impl AuthProvider for BasicAuthProvider {
    fn auth_type(&self) -> AuthType {
        AuthType::Basic
    }

    async fn authenticate(&self) -> Result<Credentials> {
        let credentials = self.encode();
        *self.cached.lock().await = Some(credentials.clone());
        Ok(credentials)
    }

    async fn refresh(&self) -> Result<Credentials> {
        let mut cached = self.cached.lock().await;
        Ok(cached.get_or_insert_with(|| self.encode()).clone())
    }

    async fn get_credentials(&self) -> Result<Credentials> {
        self.refresh().await
    }

    async fn revoke(&self) -> Result<()> {
        *self.cached.lock().await = None;
        Ok(())
    }

    async fn is_expired(&self) -> bool {
        false
    }
}
