//! Authentication providers
//!
//! Each downstream system authenticates through one [`AuthProvider`] chosen by
//! the `type` tag in its `auth_params`. Providers cache the credentials they
//! issue; the [`SecurityManager`](super::SecurityManager) caches providers.

pub mod api_key;
pub mod basic;
pub mod factory;
pub mod oauth2;

use crate::config::{secret_string, SecretString};
use crate::domain::{AuthType, Credentials, GatewayError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use std::fmt;

pub use api_key::ApiKeyProvider;
pub use basic::BasicAuthProvider;
pub use factory::{AuthProviderFactory, ProviderConstructor};
pub use oauth2::OAuth2Provider;

/// Credential provider for one downstream system
///
/// Implementations serialize their own state changes, so concurrent callers
/// never trigger duplicate token requests.
#[async_trait]
pub trait AuthProvider: Send + Sync + fmt::Debug {
    /// Provider kind
    fn auth_type(&self) -> AuthType;

    /// Obtains fresh credentials and caches them
    async fn authenticate(&self) -> Result<Credentials>;

    /// Renews the cached credentials
    async fn refresh(&self) -> Result<Credentials>;

    /// Cached credentials, renewed first when they have expired
    async fn get_credentials(&self) -> Result<Credentials>;

    /// Drops the cached credentials
    async fn revoke(&self) -> Result<()>;

    /// Whether the cached credentials have expired
    async fn is_expired(&self) -> bool;
}

/// Provider construction parameters
///
/// Values mix secret-store entries and plain `auth_params`, so every value is
/// kept redacted.
#[derive(Default, Clone)]
pub struct AuthParams {
    values: HashMap<String, SecretString>,
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("AuthParams").field("keys", &keys).finish()
    }
}

impl AuthParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: SecretString) {
        self.values.insert(key.into(), value);
    }

    /// Builder-style [`insert`](Self::insert) of a plain value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, secret_string(value.into()));
        self
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Value of `key`, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|v| v.expose_secret().as_ref())
    }

    /// Value of `key`, or an [`GatewayError::Auth`] naming the provider
    pub fn require(&self, key: &str, provider: AuthType) -> Result<&str> {
        match self.get(key) {
            Some(v) if !v.trim().is_empty() => Ok(v),
            _ => Err(GatewayError::Auth(format!(
                "{provider} authentication requires '{key}'"
            ))),
        }
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, SecretString)> for AuthParams {
    fn from_iter<I: IntoIterator<Item = (String, SecretString)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
