//! Authenticated encryption of secret values
//!
//! A [`MasterKey`] is supplied in configuration or generated once and kept in
//! a key file. [`CredentialEncryptor`] derives an AES-256 key from it with
//! PBKDF2-HMAC-SHA256 over a fixed application salt, so the same master key
//! always opens the same secret file.
//!
//! Ciphertext format: `base64(nonce[12] || aes_gcm(plaintext) || tag[16])`.
//!
//! ```rust
//! use switchyard::security::encryption::{CredentialEncryptor, MasterKey};
//!
//! let master = MasterKey::generate();
//! let encryptor = CredentialEncryptor::new(&master)?;
//!
//! let sealed = encryptor.encrypt("client-secret")?;
//! assert_eq!(encryptor.decrypt(&sealed)?, "client-secret");
//! # Ok::<(), switchyard::domain::GatewayError>(())
//! ```

use crate::config::{secret_string, SecretString};
use crate::domain::{GatewayError, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::ExposeSecret;
use sha2::Sha256;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;
use zeroize::Zeroizing;

/// Length of the derived AES key and of a generated master key
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const PBKDF2_ITERATIONS: u32 = 100_000;
const KDF_SALT: &[u8] = b"switchyard.secret-store.v1";

/// Base64-encoded master key
#[derive(Clone)]
pub struct MasterKey(SecretString);

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey([REDACTED])")
    }
}

impl MasterKey {
    /// Generates a fresh master key from 32 random bytes
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut bytes[..]);
        Self(secret_string(BASE64.encode(&bytes[..])))
    }

    /// Wraps an existing encoded key
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] for an empty key.
    pub fn from_encoded(encoded: SecretString) -> Result<Self> {
        if encoded.expose_secret().as_ref().trim().is_empty() {
            return Err(GatewayError::Configuration(
                "Master key cannot be empty".to_string(),
            ));
        }
        Ok(Self(encoded))
    }

    /// Reads the key file, or generates and writes it when missing
    ///
    /// Parent directories are created. On Unix the file is written with mode
    /// `0600`.
    pub fn load_or_generate(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let contents = fs::read_to_string(path).map_err(|e| {
                GatewayError::Storage(format!(
                    "Failed to read master key {}: {}",
                    path.display(),
                    e
                ))
            })?;
            return Self::from_encoded(secret_string(contents.trim().to_string()));
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let key = Self::generate();
        write_key_file(path, key.expose())?;

        info!(path = %path.display(), "Generated new master key");
        Ok(key)
    }

    /// Encoded key material
    pub fn expose(&self) -> &str {
        self.0.expose_secret().as_ref()
    }
}

/// Creates the key file, owner-only on Unix from the moment it exists
fn write_key_file(path: &Path, encoded: &str) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(encoded.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// AES-256-GCM sealing of secret strings
pub struct CredentialEncryptor {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CredentialEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEncryptor")
            .field("cipher", &"AES-256-GCM")
            .finish()
    }
}

impl CredentialEncryptor {
    /// Derives the encryption key from `master`
    pub fn new(master: &MasterKey) -> Result<Self> {
        let key = derive_key(master.expose().as_bytes());
        let cipher = Aes256Gcm::new_from_slice(&key[..])
            .map_err(|e| GatewayError::Configuration(format!("Invalid derived key: {e}")))?;
        Ok(Self { cipher })
    }

    /// Seals `plaintext` under a fresh random nonce
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| GatewayError::Storage(format!("Encryption failed: {e}")))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(BASE64.encode(out))
    }

    /// Opens a value produced by [`encrypt`](Self::encrypt)
    ///
    /// # Errors
    ///
    /// Every failure is [`GatewayError::Decryption`]: malformed base64, a
    /// truncated payload, a failed tag check, or non-UTF-8 plaintext.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let raw = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| GatewayError::Decryption(format!("Invalid ciphertext encoding: {e}")))?;

        if raw.len() <= NONCE_LEN {
            return Err(GatewayError::Decryption(
                "Ciphertext is too short".to_string(),
            ));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map(Zeroizing::new)
            .map_err(|_| {
                GatewayError::Decryption(
                    "Authentication tag mismatch (tampered data or wrong master key)".to_string(),
                )
            })?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| GatewayError::Decryption("Plaintext is not valid UTF-8".to_string()))
    }
}

fn derive_key(master: &[u8]) -> Zeroizing<[u8; KEY_LEN]> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(master, KDF_SALT, PBKDF2_ITERATIONS, &mut key[..]);
    key
}
