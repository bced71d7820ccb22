//! Credential security layer
//!
//! - [`encryption`] - master key handling and AES-256-GCM secret sealing
//! - [`store`] - encrypted secret persistence keyed `{system_id}:{category}:{name}`
//! - [`auth`] - Basic, OAuth2 and API-key credential providers
//! - [`webhook`] - HMAC signature verification for inbound webhooks
//! - [`manager`] - provider caching, rotation and webhook secrets
//!
//! Secrets are held in [`SecretString`](crate::config::SecretString) wrappers
//! whenever they are in memory and never appear in logs.

pub mod auth;
pub mod encryption;
pub mod manager;
pub mod store;
pub mod webhook;

pub use auth::{AuthParams, AuthProvider, AuthProviderFactory};
pub use encryption::{CredentialEncryptor, MasterKey};
pub use manager::SecurityManager;
pub use store::SecretStore;
pub use webhook::{SignatureAlgorithm, WebhookVerifier};
