//! Downstream system contract
//!
//! Concrete adapters (Salesforce, Slack, SAP, ...) implement
//! [`IntegrationSystem`]. The gateway owns connection management and fault
//! isolation; adapters only speak their system's protocol.

use crate::domain::{Credentials, Result};
use async_trait::async_trait;
use serde_json::Value;

/// One downstream system
///
/// Transport failures should be reported as
/// [`GatewayError::Adapter`](crate::domain::GatewayError::Adapter).
#[async_trait]
pub trait IntegrationSystem: Send + Sync {
    /// Opens the connection; returns whether it is now connected
    async fn connect(&self) -> Result<bool>;

    /// Closes the connection; returns whether it was open
    async fn disconnect(&self) -> Result<bool>;

    /// Whether the adapter currently holds a live connection
    async fn is_connected(&self) -> bool;

    /// Runs `operation` with already-transformed `params`
    async fn execute(
        &self,
        operation: &str,
        params: Value,
        credentials: &Credentials,
    ) -> Result<Value>;
}
