//! Auth provider construction by type tag

use super::{ApiKeyProvider, AuthParams, AuthProvider, BasicAuthProvider, OAuth2Provider};
use crate::domain::{AuthType, GatewayError, Result};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Builds a provider from its parameters
pub type ProviderConstructor = fn(&AuthParams) -> Result<Arc<dyn AuthProvider>>;

/// Maps `auth_params.type` tags to provider constructors
///
/// `basic`, `oauth2` and `api_key` are registered by default; further kinds
/// can be added with [`register`](Self::register).
#[derive(Clone)]
pub struct AuthProviderFactory {
    constructors: HashMap<String, ProviderConstructor>,
}

impl std::fmt::Debug for AuthProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthProviderFactory")
            .field("types", &self.supported_types())
            .finish()
    }
}

impl Default for AuthProviderFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: HashMap::new(),
        };
        factory.register(AuthType::Basic.as_str(), basic);
        factory.register(AuthType::OAuth2.as_str(), oauth2);
        factory.register(AuthType::ApiKey.as_str(), api_key);
        factory
    }
}

impl AuthProviderFactory {
    /// Factory with the built-in providers
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the constructor for `type_tag`
    pub fn register(&mut self, type_tag: &str, constructor: ProviderConstructor) {
        self.constructors
            .insert(normalize_tag(type_tag), constructor);
    }

    /// Builds a provider
    ///
    /// # Errors
    ///
    /// [`GatewayError::Auth`] for an unknown tag or missing required fields.
    pub fn create(&self, type_tag: &str, params: &AuthParams) -> Result<Arc<dyn AuthProvider>> {
        let tag = normalize_tag(type_tag);
        let constructor = self.constructors.get(&tag).ok_or_else(|| {
            GatewayError::Auth(format!(
                "Unsupported auth type '{type_tag}'. Supported: {}",
                self.supported_types().join(", ")
            ))
        })?;

        tracing::debug!(auth_type = %tag, params = params.len(), "Creating auth provider");
        constructor(params)
    }

    /// Registered tags, sorted
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }
}

fn basic(params: &AuthParams) -> Result<Arc<dyn AuthProvider>> {
    Ok(Arc::new(BasicAuthProvider::new(params)?))
}

fn oauth2(params: &AuthParams) -> Result<Arc<dyn AuthProvider>> {
    Ok(Arc::new(OAuth2Provider::new(params)?))
}

fn api_key(params: &AuthParams) -> Result<Arc<dyn AuthProvider>> {
    Ok(Arc::new(ApiKeyProvider::new(params)?))
}

fn normalize_tag(tag: &str) -> String {
    AuthType::from_str(tag)
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|_| tag.trim().to_lowercase())
}
