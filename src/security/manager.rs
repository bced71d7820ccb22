//! Credential lifecycle and webhook verification
//!
//! [`SecurityManager`] caches at most one auth provider per system, builds
//! providers from stored `auth` secrets merged with the system's plain
//! `auth_params`, and verifies inbound webhook signatures against stored
//! `webhook` secrets.

use super::auth::{AuthParams, AuthProvider, AuthProviderFactory};
use super::store::SecretStore;
use super::webhook::{SignatureAlgorithm, WebhookVerifier};
use crate::config::secret_string;
use crate::domain::{
    AuthType, Credentials, IntegrationConfig, Result, SystemMetadata, AUTH_CATEGORY,
    WEBHOOK_CATEGORY,
};
use dashmap::DashMap;
use secrecy::ExposeSecret;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Name of the webhook secret within the `webhook` category
pub const WEBHOOK_SECRET_NAME: &str = "secret";

pub struct SecurityManager {
    store: Arc<SecretStore>,
    factory: AuthProviderFactory,
    providers: DashMap<String, Arc<dyn AuthProvider>>,
    default_auth_type: String,
}

impl std::fmt::Debug for SecurityManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityManager")
            .field("default_auth_type", &self.default_auth_type)
            .field("cached_providers", &self.providers.len())
            .finish_non_exhaustive()
    }
}

impl SecurityManager {
    pub fn new(store: Arc<SecretStore>, factory: AuthProviderFactory) -> Self {
        Self {
            store,
            factory,
            providers: DashMap::new(),
            default_auth_type: AuthType::OAuth2.to_string(),
        }
    }

    /// Provider type used when a system's `auth_params` carry no `type`
    pub fn with_default_auth_type(mut self, auth_type: AuthType) -> Self {
        self.default_auth_type = auth_type.to_string();
        self
    }

    pub fn store(&self) -> &Arc<SecretStore> {
        &self.store
    }

    /// The cached provider for `config.system_id`, built on first use
    ///
    /// # Errors
    ///
    /// [`GatewayError::Auth`](crate::domain::GatewayError::Auth) for an
    /// unknown type or missing fields,
    /// [`GatewayError::Decryption`](crate::domain::GatewayError::Decryption)
    /// when a stored secret does not decrypt.
    pub async fn get_provider(&self, config: &IntegrationConfig) -> Result<Arc<dyn AuthProvider>> {
        if let Some(provider) = self.providers.get(&config.system_id) {
            return Ok(Arc::clone(provider.value()));
        }

        let params = self.auth_params(config).await?;
        let auth_type = config.auth_type().unwrap_or(&self.default_auth_type);
        let provider = self.factory.create(auth_type, &params)?;

        info!(
            system_id = %config.system_id,
            auth_type = %provider.auth_type(),
            "Auth provider created"
        );

        let cached = self
            .providers
            .entry(config.system_id.clone())
            .or_insert(provider)
            .clone();
        Ok(cached)
    }

    /// Current credentials for the system, refreshed if expired
    pub async fn get_credentials(&self, config: &IntegrationConfig) -> Result<Credentials> {
        self.get_provider(config).await?.get_credentials().await
    }

    pub fn has_cached_provider(&self, system_id: &str) -> bool {
        self.providers.contains_key(system_id)
    }

    /// Revokes and evicts the cached provider
    ///
    /// Returns `false` when nothing was cached. The next access rebuilds the
    /// provider from the secret store and authenticates again.
    pub async fn rotate_credentials(&self, system_id: &str) -> Result<bool> {
        let Some((_, provider)) = self.providers.remove(system_id) else {
            debug!(system_id = %system_id, "No cached provider to rotate");
            return Ok(false);
        };

        provider.revoke().await?;
        info!(system_id = %system_id, "Credentials rotated");
        Ok(true)
    }

    /// Stores authentication secrets under `{system_id}:auth:{key}`
    ///
    /// A cached provider keeps its credentials until
    /// [`rotate_credentials`](Self::rotate_credentials) is called. Returns
    /// `false` for an empty map.
    pub async fn store_credentials(
        &self,
        system_id: &str,
        credentials: &HashMap<String, String>,
    ) -> Result<bool> {
        if credentials.is_empty() {
            return Ok(false);
        }

        for (key, value) in credentials {
            self.store
                .set_secret(system_id, AUTH_CATEGORY, key, value)
                .await?;
        }

        info!(system_id = %system_id, count = credentials.len(), "Credentials stored");
        Ok(true)
    }

    /// Generates, stores and returns a new webhook secret
    ///
    /// The returned value is the only time the secret leaves the store in
    /// plaintext.
    pub async fn generate_webhook_secret(&self, system_id: &str) -> Result<String> {
        let secret = WebhookVerifier::generate_secret();
        self.store_webhook_secret(system_id, &secret).await?;
        info!(system_id = %system_id, "Webhook secret generated");
        Ok(secret)
    }

    /// Stores an externally issued webhook secret
    pub async fn store_webhook_secret(&self, system_id: &str, secret: &str) -> Result<()> {
        self.store
            .set_secret(system_id, WEBHOOK_CATEGORY, WEBHOOK_SECRET_NAME, secret)
            .await
    }

    /// Verifies a webhook using the default signature headers and SHA-256
    pub async fn verify_webhook_signature(
        &self,
        system_id: &str,
        payload: &[u8],
        headers: &HashMap<String, String>,
    ) -> Result<bool> {
        self.verify_webhook(system_id, &SystemMetadata::default(), payload, headers)
            .await
    }

    /// Verifies a webhook using the system's configured header and algorithm
    ///
    /// `Ok(false)` for a missing secret, missing header, unsupported
    /// algorithm or mismatch; errors only when the secret cannot be read.
    pub async fn verify_webhook(
        &self,
        system_id: &str,
        metadata: &SystemMetadata,
        payload: &[u8],
        headers: &HashMap<String, String>,
    ) -> Result<bool> {
        let Some(secret) = self
            .store
            .get_secret(system_id, WEBHOOK_CATEGORY, WEBHOOK_SECRET_NAME)
            .await?
        else {
            warn!(system_id = %system_id, "No webhook secret stored");
            return Ok(false);
        };

        let Some(signature) =
            WebhookVerifier::find_signature(headers, metadata.webhook_signature_header.as_deref())
        else {
            warn!(system_id = %system_id, "Webhook signature header missing");
            return Ok(false);
        };

        let algorithm = match metadata.webhook_signature_algorithm.as_deref() {
            None => SignatureAlgorithm::default(),
            Some(name) => match name.parse::<SignatureAlgorithm>() {
                Ok(algorithm) => algorithm,
                Err(e) => {
                    warn!(system_id = %system_id, error = %e, "Cannot verify webhook");
                    return Ok(false);
                }
            },
        };

        let valid = WebhookVerifier::verify(
            secret.expose_secret().as_bytes(),
            payload,
            signature,
            algorithm,
        );
        debug!(system_id = %system_id, algorithm = %algorithm, valid, "Webhook signature checked");
        Ok(valid)
    }

    async fn auth_params(&self, config: &IntegrationConfig) -> Result<AuthParams> {
        let mut params: AuthParams = config
            .auth_params
            .iter()
            .filter(|(key, _)| key.as_str() != "type")
            .filter_map(|(key, value)| {
                plain_value(value).map(|v| (key.clone(), secret_string(v)))
            })
            .collect();

        // Stored secrets take precedence over plain configuration
        for (name, value) in self
            .store
            .get_category(&config.system_id, AUTH_CATEGORY)
            .await?
        {
            params.insert(name, value);
        }

        Ok(params)
    }
}

fn plain_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
