//! Static API key authentication

use super::{AuthParams, AuthProvider};
use crate::config::{secret_string, SecretString};
use crate::domain::{AuthType, Credentials, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;

/// Header used when `header_name` is not configured
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Sends a fixed key in a fixed header
#[derive(Debug)]
pub struct ApiKeyProvider {
    header_name: String,
    api_key: SecretString,
}

impl ApiKeyProvider {
    /// Requires `api_key`; `header_name` defaults to `X-API-Key`
    pub fn new(params: &AuthParams) -> Result<Self> {
        let api_key = secret_string(params.require("api_key", AuthType::ApiKey)?.to_string());
        let header_name = params
            .get("header_name")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or(DEFAULT_API_KEY_HEADER)
            .to_string();

        Ok(Self {
            header_name,
            api_key,
        })
    }

    fn credentials(&self) -> Credentials {
        Credentials::api_key(
            self.header_name.clone(),
            self.api_key.expose_secret().as_ref().to_string(),
        )
    }
}

#[async_trait]
impl AuthProvider for ApiKeyProvider {
    fn auth_type(&self) -> AuthType {
        AuthType::ApiKey
    }

    async fn authenticate(&self) -> Result<Credentials> {
        Ok(self.credentials())
    }

    async fn refresh(&self) -> Result<Credentials> {
        Ok(self.credentials())
    }

    async fn get_credentials(&self) -> Result<Credentials> {
        Ok(self.credentials())
    }

    async fn revoke(&self) -> Result<()> {
        Ok(())
    }

    async fn is_expired(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_header() {
        let provider = ApiKeyProvider::new(&AuthParams::new().with("api_key", "k-1")).unwrap();
        let (name, value) = provider.get_credentials().await.unwrap().authorization_header();
        assert_eq!(name, "X-API-Key");
        assert_eq!(value, "k-1");
    }

    #[tokio::test]
    async fn test_custom_header() {
        let params = AuthParams::new()
            .with("api_key", "k-2")
            .with("header_name", "X-Slack-Token");
        let provider = ApiKeyProvider::new(&params).unwrap();
        let creds = provider.authenticate().await.unwrap();
        assert_eq!(creds.header_name, "X-Slack-Token");
        assert!(!provider.is_expired().await);
    }

    #[test]
    fn test_missing_key() {
        assert!(ApiKeyProvider::new(&AuthParams::new()).is_err());
    }
}
