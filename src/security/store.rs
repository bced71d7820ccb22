//! Encrypted secret store
//!
//! Secrets are held as ciphertext only, keyed `"{system_id}:{category}:{name}"`,
//! and decrypted on read. A file-backed store rewrites its JSON file on every
//! mutation (temp file, then rename). The in-memory map only changes once the
//! file write succeeds. Writes are last-writer-wins.

use super::encryption::CredentialEncryptor;
use crate::config::{secret_string, SecretString};
use crate::domain::{GatewayError, Result, SecretKey};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Ciphertext-only secret storage
#[derive(Debug)]
pub struct SecretStore {
    encryptor: CredentialEncryptor,
    path: Option<PathBuf>,
    secrets: RwLock<BTreeMap<String, String>>,
}

impl SecretStore {
    /// Store that lives only in memory
    pub fn in_memory(encryptor: CredentialEncryptor) -> Self {
        Self {
            encryptor,
            path: None,
            secrets: RwLock::new(BTreeMap::new()),
        }
    }

    /// Opens a file-backed store, reading existing ciphertext if the file exists
    ///
    /// Values are not decrypted here; a wrong master key surfaces on first read.
    pub async fn open(path: impl AsRef<Path>, encryptor: CredentialEncryptor) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let secrets = match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                GatewayError::Storage(format!(
                    "Secret file {} is corrupt: {}",
                    path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(GatewayError::Storage(format!(
                    "Failed to read secret file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        info!(path = %path.display(), count = secrets.len(), "Secret store opened");

        Ok(Self {
            encryptor,
            path: Some(path),
            secrets: RwLock::new(secrets),
        })
    }

    /// Encrypts and stores a secret, replacing any previous value
    pub async fn set_secret(
        &self,
        system_id: &str,
        category: &str,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let key = secret_key(system_id, category, name)?;
        let sealed = self.encryptor.encrypt(value)?;

        let mut secrets = self.secrets.write().await;
        let mut updated = secrets.clone();
        updated.insert(key.to_string(), sealed);
        self.persist(&updated).await?;
        *secrets = updated;

        debug!(key = %key, "Secret stored");
        Ok(())
    }

    /// Decrypts a secret
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decryption`] when the stored ciphertext does
    /// not open under the current key.
    pub async fn get_secret(
        &self,
        system_id: &str,
        category: &str,
        name: &str,
    ) -> Result<Option<SecretString>> {
        let key = secret_key(system_id, category, name)?;
        let secrets = self.secrets.read().await;

        secrets
            .get(&key.to_string())
            .map(|sealed| self.encryptor.decrypt(sealed).map(secret_string))
            .transpose()
    }

    /// Removes a secret; returns whether it existed
    pub async fn delete_secret(&self, system_id: &str, category: &str, name: &str) -> Result<bool> {
        let key = secret_key(system_id, category, name)?;

        let mut secrets = self.secrets.write().await;
        if !secrets.contains_key(&key.to_string()) {
            return Ok(false);
        }

        let mut updated = secrets.clone();
        updated.remove(&key.to_string());
        self.persist(&updated).await?;
        *secrets = updated;

        debug!(key = %key, "Secret deleted");
        Ok(true)
    }

    /// Full keys starting with `prefix`, in sorted order
    pub async fn list_keys(&self, prefix: &str) -> Vec<String> {
        self.secrets
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Every secret of one category for a system, keyed by name
    pub async fn get_category(
        &self,
        system_id: &str,
        category: &str,
    ) -> Result<HashMap<String, SecretString>> {
        let prefix = SecretKey::prefix(system_id, category);
        let secrets = self.secrets.read().await;

        secrets
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, sealed)| {
                let name = k[prefix.len()..].to_string();
                let value = self.encryptor.decrypt(sealed)?;
                Ok((name, secret_string(value)))
            })
            .collect()
    }

    async fn persist(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(secrets)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            GatewayError::Storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            GatewayError::Storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;
        Ok(())
    }
}

fn secret_key(system_id: &str, category: &str, name: &str) -> Result<SecretKey> {
    SecretKey::new(system_id, category, name).map_err(GatewayError::Validation)
}
