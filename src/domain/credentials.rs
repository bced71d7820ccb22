//! Credentials handed to adapters
//!
//! Credentials are ephemeral: an auth provider issues them, the gateway passes
//! them to the adapter for one call, and nothing persists them.

use crate::config::{secret_string, SecretString};
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of authentication provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// HTTP Basic authentication
    Basic,
    /// OAuth 2.0 client-credentials grant
    #[serde(rename = "oauth2")]
    OAuth2,
    /// Static API key header
    ApiKey,
}

impl AuthType {
    /// Type tag used in `auth_params.type`
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Basic => "basic",
            AuthType::OAuth2 => "oauth2",
            AuthType::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(AuthType::Basic),
            "oauth2" | "oauth" => Ok(AuthType::OAuth2),
            "api_key" | "apikey" => Ok(AuthType::ApiKey),
            other => Err(format!(
                "Unknown auth type: {other}. Expected 'basic', 'oauth2' or 'api_key'"
            )),
        }
    }
}

/// Credentials for one downstream call
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Provider kind that issued the credentials
    pub auth_type: AuthType,

    /// Token, encoded basic pair, or API key
    token: SecretString,

    /// OAuth2 token type (`Bearer`)
    pub token_type: Option<String>,

    /// Header the credentials are sent in
    pub header_name: String,

    /// When the credentials were issued
    pub issued_at: DateTime<Utc>,

    /// When the credentials stop being valid, if ever
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Basic credentials from an already base64-encoded `user:pass` pair
    pub fn basic(encoded: String) -> Self {
        Self {
            auth_type: AuthType::Basic,
            token: secret_string(encoded),
            token_type: None,
            header_name: "Authorization".to_string(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    /// OAuth2 bearer credentials
    pub fn oauth2(
        access_token: String,
        token_type: impl Into<String>,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            auth_type: AuthType::OAuth2,
            token: secret_string(access_token),
            token_type: Some(token_type.into()),
            header_name: "Authorization".to_string(),
            issued_at,
            expires_at,
        }
    }

    /// Static API key credentials
    pub fn api_key(header_name: impl Into<String>, key: String) -> Self {
        Self {
            auth_type: AuthType::ApiKey,
            token: secret_string(key),
            token_type: None,
            header_name: header_name.into(),
            issued_at: Utc::now(),
            expires_at: None,
        }
    }

    /// Raw token value
    pub fn token(&self) -> &str {
        self.token.expose_secret().as_ref()
    }

    /// Whether the credentials have passed their expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires| Utc::now() >= expires)
    }

    /// Header name and value to send downstream
    pub fn authorization_header(&self) -> (String, String) {
        let value = match self.auth_type {
            AuthType::Basic => format!("Basic {}", self.token()),
            AuthType::OAuth2 => format!(
                "{} {}",
                self.token_type.as_deref().unwrap_or("Bearer"),
                self.token()
            ),
            AuthType::ApiKey => self.token().to_string(),
        };
        (self.header_name.clone(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_type_from_str() {
        assert_eq!(AuthType::from_str("OAuth2").unwrap(), AuthType::OAuth2);
        assert_eq!(AuthType::from_str("apikey").unwrap(), AuthType::ApiKey);
        assert_eq!(AuthType::from_str("basic").unwrap(), AuthType::Basic);
        assert!(AuthType::from_str("kerberos").is_err());
    }

    #[test]
    fn test_auth_type_serde() {
        assert_eq!(serde_json::to_string(&AuthType::OAuth2).unwrap(), "\"oauth2\"");
        assert_eq!(serde_json::to_string(&AuthType::ApiKey).unwrap(), "\"api_key\"");
    }

    #[test]
    fn test_authorization_headers() {
        let basic = Credentials::basic("dXNlcjpwYXNz".to_string());
        assert_eq!(
            basic.authorization_header(),
            ("Authorization".to_string(), "Basic dXNlcjpwYXNz".to_string())
        );

        let oauth = Credentials::oauth2("tok".to_string(), "Bearer", Utc::now(), None);
        assert_eq!(oauth.authorization_header().1, "Bearer tok");

        let key = Credentials::api_key("X-API-Key", "k-123".to_string());
        assert_eq!(
            key.authorization_header(),
            ("X-API-Key".to_string(), "k-123".to_string())
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let creds = Credentials::api_key("X-API-Key", "super-secret-key".to_string());
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret-key"));
    }

    #[test]
    fn test_is_expired() {
        let past = Utc::now() - chrono::Duration::seconds(10);
        let expired = Credentials::oauth2("t".to_string(), "Bearer", past, Some(past));
        assert!(expired.is_expired());
        assert!(!Credentials::basic("x".to_string()).is_expired());
    }
}
