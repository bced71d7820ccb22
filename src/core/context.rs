//! Application context
//!
//! Everything the gateway needs is built once from [`SwitchyardConfig`] and
//! handed around explicitly; there is no process-wide state.

use crate::adapters::factory::AdapterFactory;
use crate::adapters::monitoring::{MonitoringService, TracingMonitor};
use crate::adapters::registry::{FileRegistry, IntegrationRegistry};
use crate::config::{SecurityConfig, SwitchyardConfig};
use crate::core::breaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use crate::core::gateway::Gateway;
use crate::core::transform::{CanonicalDataModel, SchemaRegistry, TransformerFactory};
use crate::domain::{AuthType, GatewayError, Result};
use crate::security::{AuthProviderFactory, CredentialEncryptor, MasterKey, SecretStore, SecurityManager};
use std::str::FromStr;
use std::sync::Arc;

/// Wired gateway and the components behind it
#[derive(Debug)]
pub struct GatewayContext {
    config: SwitchyardConfig,
    gateway: Arc<Gateway>,
    schemas: Arc<SchemaRegistry>,
}

impl GatewayContext {
    /// Builds the gateway from configuration
    ///
    /// Loads (or generates) the master key, opens the secret store and the
    /// registry, and loads schemas from `schemas.directory` when set.
    pub async fn from_config(config: &SwitchyardConfig, adapters: AdapterFactory) -> Result<Self> {
        Self::with_monitor(config, adapters, Arc::new(TracingMonitor)).await
    }

    /// As [`from_config`](Self::from_config), reporting to `monitor`
    pub async fn with_monitor(
        config: &SwitchyardConfig,
        adapters: AdapterFactory,
        monitor: Arc<dyn MonitoringService>,
    ) -> Result<Self> {
        config.validate().map_err(GatewayError::Configuration)?;

        let security = Arc::new(open_security(&config.security).await?);

        let registry: Arc<dyn IntegrationRegistry> =
            Arc::new(FileRegistry::open(&config.registry.path).await?);

        let schemas = Arc::new(SchemaRegistry::new());
        if let Some(dir) = &config.schemas.directory {
            schemas.load_dir(dir)?;
        }
        let transformers = Arc::new(TransformerFactory::new(CanonicalDataModel::new(
            schemas.clone(),
        )));

        let breaker_config = CircuitBreakerConfig::from(&config.circuit_breaker);
        breaker_config.validate()?;
        let breakers = Arc::new(CircuitBreakerRegistry::new(breaker_config));

        let gateway = Gateway::new(registry, Arc::new(adapters), security)
            .with_transformers(transformers)
            .with_breakers(breakers)
            .with_monitor(monitor);

        tracing::info!(
            registry = %config.registry.path,
            secrets = %config.security.secrets_path,
            "Gateway context initialized"
        );

        Ok(Self {
            config: config.clone(),
            gateway: Arc::new(gateway),
            schemas,
        })
    }

    pub fn config(&self) -> &SwitchyardConfig {
        &self.config
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    pub fn security(&self) -> &Arc<SecurityManager> {
        self.gateway.security()
    }

    pub fn registry(&self) -> &Arc<dyn IntegrationRegistry> {
        self.gateway.registry()
    }

    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }
}

/// Master key from the inline setting, else from (or into) the key file
pub fn load_master_key(security: &SecurityConfig) -> Result<MasterKey> {
    match &security.master_key {
        Some(key) => MasterKey::from_encoded(key.clone()),
        None => MasterKey::load_or_generate(&security.master_key_path),
    }
}

/// Security manager over the configured secret store
pub async fn open_security(security: &SecurityConfig) -> Result<SecurityManager> {
    let master_key = load_master_key(security)?;
    let encryptor = CredentialEncryptor::new(&master_key)?;
    let store = SecretStore::open(&security.secrets_path, encryptor).await?;
    let default_auth_type =
        AuthType::from_str(&security.default_auth_type).map_err(GatewayError::Configuration)?;

    Ok(SecurityManager::new(Arc::new(store), AuthProviderFactory::default())
        .with_default_auth_type(default_auth_type))
}
