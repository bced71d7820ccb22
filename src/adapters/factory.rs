//! Adapter construction and caching
//!
//! Adapters are selected by `system_type` from a table of registered
//! constructors and cached per `system_id`, so every call to a system shares
//! one adapter instance.

use crate::adapters::system::IntegrationSystem;
use crate::domain::{GatewayError, IntegrationConfig, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Builds an adapter for one system configuration
pub type AdapterConstructor =
    Arc<dyn Fn(&IntegrationConfig) -> Result<Arc<dyn IntegrationSystem>> + Send + Sync>;

/// Cached adapter plus the lock serializing its connect
pub struct AdapterHandle {
    system_id: String,
    system: Arc<dyn IntegrationSystem>,
    connect_lock: Mutex<()>,
}

impl AdapterHandle {
    fn new(system_id: impl Into<String>, system: Arc<dyn IntegrationSystem>) -> Self {
        Self {
            system_id: system_id.into(),
            system,
            connect_lock: Mutex::new(()),
        }
    }

    pub fn system(&self) -> &Arc<dyn IntegrationSystem> {
        &self.system
    }

    /// Connects the adapter unless it already is
    ///
    /// Concurrent callers wait on the same connect attempt instead of opening
    /// their own.
    pub async fn ensure_connected(&self) -> Result<()> {
        if self.system.is_connected().await {
            return Ok(());
        }

        let _guard = self.connect_lock.lock().await;
        if self.system.is_connected().await {
            return Ok(());
        }

        tracing::debug!(system_id = %self.system_id, "Connecting adapter");
        if self.system.connect().await? {
            Ok(())
        } else {
            Err(GatewayError::adapter(
                &self.system_id,
                "adapter reported connect failure",
            ))
        }
    }
}

impl std::fmt::Debug for AdapterHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterHandle")
            .field("system_id", &self.system_id)
            .finish_non_exhaustive()
    }
}

/// Registered adapter constructors and the per-system adapter cache
#[derive(Default)]
pub struct AdapterFactory {
    constructors: HashMap<String, AdapterConstructor>,
    adapters: DashMap<String, Arc<AdapterHandle>>,
}

impl AdapterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the constructor for `system_type`, replacing any previous one
    pub fn register<F>(&mut self, system_type: impl Into<String>, constructor: F)
    where
        F: Fn(&IntegrationConfig) -> Result<Arc<dyn IntegrationSystem>> + Send + Sync + 'static,
    {
        let system_type = system_type.into().to_lowercase();
        tracing::debug!(system_type = %system_type, "Registering adapter constructor");
        self.constructors.insert(system_type, Arc::new(constructor));
    }

    /// Builder form of [`register`](Self::register)
    pub fn with_adapter<F>(mut self, system_type: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&IntegrationConfig) -> Result<Arc<dyn IntegrationSystem>> + Send + Sync + 'static,
    {
        self.register(system_type, constructor);
        self
    }

    /// The cached adapter for `config.system_id`, built on first use
    ///
    /// # Errors
    ///
    /// [`GatewayError::UnsupportedSystemType`] when no constructor is
    /// registered for `config.system_type`; constructor errors are returned
    /// as-is.
    pub fn get_adapter(&self, config: &IntegrationConfig) -> Result<Arc<AdapterHandle>> {
        if let Some(handle) = self.adapters.get(&config.system_id) {
            return Ok(Arc::clone(handle.value()));
        }

        let constructor = self
            .constructors
            .get(&config.system_type.to_lowercase())
            .ok_or_else(|| GatewayError::UnsupportedSystemType(config.system_type.clone()))?;

        let system = constructor(config)?;
        tracing::info!(
            system_id = %config.system_id,
            system_type = %config.system_type,
            "Created adapter"
        );

        // A racing caller may have inserted first; keep whichever landed.
        let handle = self
            .adapters
            .entry(config.system_id.clone())
            .or_insert_with(|| Arc::new(AdapterHandle::new(&config.system_id, system)))
            .clone();
        Ok(handle)
    }

    /// Drops the cached adapter, disconnecting it
    pub async fn evict(&self, system_id: &str) -> Result<bool> {
        let Some((_, handle)) = self.adapters.remove(system_id) else {
            return Ok(false);
        };
        if handle.system.is_connected().await {
            handle.system.disconnect().await?;
        }
        Ok(true)
    }

    pub fn supports(&self, system_type: &str) -> bool {
        self.constructors.contains_key(&system_type.to_lowercase())
    }

    /// Registered system types, sorted
    pub fn supported_types(&self) -> Vec<String> {
        let mut types: Vec<_> = self.constructors.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn is_cached(&self, system_id: &str) -> bool {
        self.adapters.contains_key(system_id)
    }
}

impl std::fmt::Debug for AdapterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("supported_types", &self.supported_types())
            .field("cached", &self.adapters.len())
            .finish()
    }
}
