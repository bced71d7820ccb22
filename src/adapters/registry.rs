//! Integration registry
//!
//! The gateway looks systems up on every call and never caches the result, so
//! registry updates take effect on the next request.

use crate::domain::{GatewayError, IntegrationConfig, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// Criteria for [`IntegrationRegistry::list_systems`]
#[derive(Debug, Clone, Default)]
pub struct SystemFilter {
    /// Only systems of this type
    pub system_type: Option<String>,
    /// Only enabled (`true`) or disabled (`false`) systems
    pub enabled: Option<bool>,
}

impl SystemFilter {
    fn matches(&self, config: &IntegrationConfig) -> bool {
        self.system_type
            .as_deref()
            .map_or(true, |t| config.system_type == t)
            && self.enabled.map_or(true, |e| config.enabled == e)
    }
}

/// Storage of integration configurations
#[async_trait]
pub trait IntegrationRegistry: Send + Sync {
    /// Configuration for `system_id`, if registered
    async fn get_system(&self, system_id: &str) -> Result<Option<IntegrationConfig>>;

    /// Registered systems matching `filter`, ordered by id
    async fn list_systems(&self, filter: &SystemFilter) -> Result<Vec<IntegrationConfig>>;

    /// Adds a new system
    ///
    /// # Errors
    ///
    /// [`GatewayError::Validation`] if the config is invalid or the id is taken.
    async fn register_system(&self, config: IntegrationConfig) -> Result<()>;

    /// Removes a system; returns whether it existed
    async fn unregister_system(&self, system_id: &str) -> Result<bool>;

    /// Replaces an existing system
    ///
    /// # Errors
    ///
    /// [`GatewayError::NotFound`] if the system is not registered.
    async fn update_system(&self, config: IntegrationConfig) -> Result<()>;
}

/// Registry backed by a JSON file (`system_id -> config`) or held in memory
#[derive(Debug)]
pub struct FileRegistry {
    path: Option<PathBuf>,
    systems: RwLock<BTreeMap<String, IntegrationConfig>>,
}

impl FileRegistry {
    /// Empty registry without persistence
    pub fn in_memory() -> Self {
        Self {
            path: None,
            systems: RwLock::new(BTreeMap::new()),
        }
    }

    /// Opens the registry file, starting empty when it does not exist
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let systems: BTreeMap<String, IntegrationConfig> =
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
                Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                    GatewayError::Storage(format!(
                        "Registry file {} is invalid: {}",
                        path.display(),
                        e
                    ))
                })?,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
                Err(e) => return Err(e.into()),
            };

        for (id, config) in &systems {
            if id != &config.system_id {
                return Err(GatewayError::Storage(format!(
                    "Registry entry '{id}' holds config for '{}'",
                    config.system_id
                )));
            }
        }

        tracing::info!(path = %path.display(), systems = systems.len(), "Registry loaded");

        Ok(Self {
            path: Some(path),
            systems: RwLock::new(systems),
        })
    }

    /// In-memory registry pre-populated with `configs`
    pub fn with_systems(configs: impl IntoIterator<Item = IntegrationConfig>) -> Self {
        Self {
            path: None,
            systems: RwLock::new(
                configs
                    .into_iter()
                    .map(|c| (c.system_id.clone(), c))
                    .collect(),
            ),
        }
    }

    async fn persist(&self, systems: &BTreeMap<String, IntegrationConfig>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(systems)?).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl IntegrationRegistry for FileRegistry {
    async fn get_system(&self, system_id: &str) -> Result<Option<IntegrationConfig>> {
        Ok(self.systems.read().await.get(system_id).cloned())
    }

    async fn list_systems(&self, filter: &SystemFilter) -> Result<Vec<IntegrationConfig>> {
        Ok(self
            .systems
            .read()
            .await
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn register_system(&self, config: IntegrationConfig) -> Result<()> {
        config.validate().map_err(GatewayError::Validation)?;

        let mut systems = self.systems.write().await;
        if systems.contains_key(&config.system_id) {
            return Err(GatewayError::Validation(format!(
                "System '{}' is already registered",
                config.system_id
            )));
        }

        tracing::info!(
            system_id = %config.system_id,
            system_type = %config.system_type,
            "Registering integration system"
        );
        let mut updated = systems.clone();
        updated.insert(config.system_id.clone(), config);
        self.persist(&updated).await?;
        *systems = updated;
        Ok(())
    }

    async fn unregister_system(&self, system_id: &str) -> Result<bool> {
        let mut systems = self.systems.write().await;
        if !systems.contains_key(system_id) {
            return Ok(false);
        }

        let mut updated = systems.clone();
        updated.remove(system_id);
        self.persist(&updated).await?;
        *systems = updated;
        Ok(true)
    }

    async fn update_system(&self, config: IntegrationConfig) -> Result<()> {
        config.validate().map_err(GatewayError::Validation)?;

        let mut systems = self.systems.write().await;
        if !systems.contains_key(&config.system_id) {
            return Err(GatewayError::NotFound(format!(
                "Integration system '{}'",
                config.system_id
            )));
        }

        let mut updated = systems.clone();
        updated.insert(config.system_id.clone(), config);
        self.persist(&updated).await?;
        *systems = updated;
        Ok(())
    }
}
