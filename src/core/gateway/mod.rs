//! Request routing
//!
//! [`Gateway`] is the single entry point for calls to downstream systems. For
//! every call it:
//!
//! 1. looks the system up in the registry
//! 2. obtains the cached adapter, auth provider and transformer
//! 3. transforms the parameters outbound, validating them
//! 4. connects if needed and executes through the system's circuit breaker
//! 5. transforms the result inbound, stamping provenance
//! 6. reports one terminal telemetry event, whatever the outcome
//!
//! Errors reach the caller unchanged.

pub mod telemetry;

use crate::adapters::factory::{AdapterFactory, AdapterHandle};
use crate::adapters::monitoring::{HealthReport, MonitoringService, TracingMonitor, WebhookEvent};
use crate::adapters::registry::IntegrationRegistry;
use crate::core::breaker::CircuitBreakerRegistry;
use crate::core::transform::TransformerFactory;
use crate::domain::{Credentials, GatewayError, IntegrationConfig, RequestContext, Result};
use crate::security::SecurityManager;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use telemetry::TelemetryScope;

/// Operation name reported for webhook registration
pub const REGISTER_WEBHOOK_OPERATION: &str = "register_webhook";

/// Prefix of the adapter operation used for native batch calls
pub const BATCH_OPERATION_PREFIX: &str = "batch_";

pub struct Gateway {
    registry: Arc<dyn IntegrationRegistry>,
    adapters: Arc<AdapterFactory>,
    security: Arc<SecurityManager>,
    transformers: Arc<TransformerFactory>,
    breakers: Arc<CircuitBreakerRegistry>,
    monitor: Arc<dyn MonitoringService>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("adapters", &self.adapters)
            .field("security", &self.security)
            .field("breakers", &self.breakers.len())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Gateway with default breakers, no schemas and tracing telemetry
    pub fn new(
        registry: Arc<dyn IntegrationRegistry>,
        adapters: Arc<AdapterFactory>,
        security: Arc<SecurityManager>,
    ) -> Self {
        Self {
            registry,
            adapters,
            security,
            transformers: Arc::new(TransformerFactory::default()),
            breakers: Arc::new(CircuitBreakerRegistry::default()),
            monitor: Arc::new(TracingMonitor),
        }
    }

    pub fn with_transformers(mut self, transformers: Arc<TransformerFactory>) -> Self {
        self.transformers = transformers;
        self
    }

    pub fn with_breakers(mut self, breakers: Arc<CircuitBreakerRegistry>) -> Self {
        self.breakers = breakers;
        self
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn MonitoringService>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn registry(&self) -> &Arc<dyn IntegrationRegistry> {
        &self.registry
    }

    pub fn security(&self) -> &Arc<SecurityManager> {
        &self.security
    }

    pub fn breakers(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.breakers
    }

    /// Executes `operation` on a system
    ///
    /// # Errors
    ///
    /// - [`GatewayError::NotFound`] for an unregistered system
    /// - [`GatewayError::UnsupportedOperation`] for a disabled system
    /// - [`GatewayError::UnsupportedSystemType`] when no adapter is registered
    /// - [`GatewayError::SchemaValidation`] when `params` or the result fail
    ///   schema validation
    /// - [`GatewayError::CircuitOpen`] while the system's breaker is open
    /// - [`GatewayError::Auth`] when credentials cannot be obtained
    /// - adapter errors as reported by the adapter
    pub async fn route_request(
        &self,
        system_id: &str,
        operation: &str,
        params: Option<Value>,
        context: Option<RequestContext>,
    ) -> Result<Value> {
        let context = context.unwrap_or_default();
        let scope = TelemetryScope::start(self.monitor.clone(), system_id, operation, context);

        let result = self.route(system_id, operation, params).await;
        scope.finish(&result);
        result
    }

    /// Executes `operation` for every item
    ///
    /// Systems with native batch support get one `batch_<operation>` call.
    /// Otherwise the items are routed one at a time, in order, and the first
    /// failure aborts the batch with that item's error.
    pub async fn execute_batch(
        &self,
        system_id: &str,
        operation: &str,
        items: Vec<Value>,
        context: Option<RequestContext>,
    ) -> Result<Vec<Value>> {
        let context = context.unwrap_or_default();
        let batch_operation = format!("{BATCH_OPERATION_PREFIX}{operation}");
        let scope = TelemetryScope::start(
            self.monitor.clone(),
            system_id,
            &batch_operation,
            context.clone(),
        );

        let result = self
            .batch(system_id, operation, &batch_operation, items, &context)
            .await;
        scope.finish(&result);
        result
    }

    /// Registers a webhook callback with a system
    ///
    /// Parameters are passed to the adapter untransformed.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UnsupportedOperation`] unless the system's metadata
    /// declares webhook support.
    pub async fn register_webhook(
        &self,
        system_id: &str,
        event_type: &str,
        callback_url: &str,
        context: Option<RequestContext>,
    ) -> Result<Value> {
        let context = context.unwrap_or_default();
        let scope = TelemetryScope::start(
            self.monitor.clone(),
            system_id,
            REGISTER_WEBHOOK_OPERATION,
            context,
        );

        let result = self
            .register_webhook_inner(system_id, event_type, callback_url)
            .await;
        scope.finish(&result);
        result
    }

    /// Verifies and normalizes an inbound webhook
    ///
    /// # Errors
    ///
    /// [`GatewayError::Auth`] when the signature does not verify,
    /// [`GatewayError::Serialization`] when the payload is not JSON.
    pub async fn handle_webhook(
        &self,
        system_id: &str,
        payload: &[u8],
        headers: &HashMap<String, String>,
        context: Option<RequestContext>,
    ) -> Result<Value> {
        let context = context.unwrap_or_default();
        let config = self.lookup(system_id).await?;

        let verified = self
            .security
            .verify_webhook(system_id, &config.metadata, payload, headers)
            .await?;

        let parsed: Option<Value> = serde_json::from_slice(payload).ok();
        self.monitor.log_webhook_event(&WebhookEvent {
            system_id: system_id.to_string(),
            event_type: parsed.as_ref().and_then(webhook_event_type),
            verified,
            payload_bytes: payload.len(),
            request_id: context.request_id.to_string(),
        });

        if !verified {
            return Err(GatewayError::Auth(format!(
                "Invalid webhook signature for system '{system_id}'"
            )));
        }

        let payload = match parsed {
            Some(value) => value,
            None => serde_json::from_slice(payload)?,
        };
        let transformer = self.transformers.get_transformer(&config)?;
        transformer.transform_result(&payload)
    }

    /// Connects the adapter if needed and reports connection and breaker state
    pub async fn health_check(&self, system_id: &str) -> Result<HealthReport> {
        let config = self.lookup(system_id).await?;
        let handle = self.adapters.get_adapter(&config)?;

        let error = handle.ensure_connected().await.err().map(|e| e.to_string());
        let stats = self.breakers.get_or_create(system_id).stats();

        let report = HealthReport {
            system_id: system_id.to_string(),
            connected: handle.system().is_connected().await,
            breaker_state: stats.state.to_string(),
            failure_count: stats.failure_count,
            error,
        };
        self.monitor.log_health_check(&report);
        Ok(report)
    }

    async fn route(&self, system_id: &str, operation: &str, params: Option<Value>) -> Result<Value> {
        let config = self.lookup(system_id).await?;
        let handle = self.adapters.get_adapter(&config)?;
        let credentials = self.security.get_credentials(&config).await?;
        let transformer = self.transformers.get_transformer(&config)?;

        let params = params.unwrap_or_else(|| Value::Object(Map::new()));
        let payload = transformer.transform_to_external(&params)?;

        let raw = self
            .call(&config, &handle, operation, payload, &credentials)
            .await?;
        transformer.transform_result(&raw)
    }

    async fn batch(
        &self,
        system_id: &str,
        operation: &str,
        batch_operation: &str,
        items: Vec<Value>,
        context: &RequestContext,
    ) -> Result<Vec<Value>> {
        let config = self.lookup(system_id).await?;

        if !config.metadata.supports_batch {
            tracing::debug!(
                system_id = %system_id,
                operation = %operation,
                items = items.len(),
                "No native batch support, routing items sequentially"
            );
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let result = self
                    .route_request(system_id, operation, Some(item), Some(context.clone()))
                    .await?;
                results.push(result);
            }
            return Ok(results);
        }

        let handle = self.adapters.get_adapter(&config)?;
        let credentials = self.security.get_credentials(&config).await?;
        let transformer = self.transformers.get_transformer(&config)?;

        let payload = items
            .iter()
            .map(|item| transformer.transform_to_external(item))
            .collect::<Result<Vec<_>>>()?;

        let raw = self
            .call(
                &config,
                &handle,
                batch_operation,
                json!({ "items": payload }),
                &credentials,
            )
            .await?;

        batch_results(raw)
            .iter()
            .map(|item| transformer.transform_result(item))
            .collect()
    }

    async fn register_webhook_inner(
        &self,
        system_id: &str,
        event_type: &str,
        callback_url: &str,
    ) -> Result<Value> {
        let config = self.lookup(system_id).await?;
        if !config.metadata.supports_webhooks {
            return Err(GatewayError::UnsupportedOperation {
                system_id: system_id.to_string(),
                operation: REGISTER_WEBHOOK_OPERATION.to_string(),
            });
        }

        let handle = self.adapters.get_adapter(&config)?;
        let credentials = self.security.get_credentials(&config).await?;
        let params = json!({ "event_type": event_type, "callback_url": callback_url });

        self.call(
            &config,
            &handle,
            REGISTER_WEBHOOK_OPERATION,
            params,
            &credentials,
        )
        .await
    }

    /// Connect-if-needed plus execute, both inside the system's breaker
    async fn call(
        &self,
        config: &IntegrationConfig,
        handle: &AdapterHandle,
        operation: &str,
        params: Value,
        credentials: &Credentials,
    ) -> Result<Value> {
        let breaker = self.breakers.get_or_create(&config.system_id);
        breaker
            .execute(|| async {
                handle.ensure_connected().await?;
                handle.system().execute(operation, params, credentials).await
            })
            .await
    }

    async fn lookup(&self, system_id: &str) -> Result<IntegrationConfig> {
        let config = self
            .registry
            .get_system(system_id)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("Integration system '{system_id}'")))?;

        if !config.enabled {
            return Err(GatewayError::UnsupportedOperation {
                system_id: system_id.to_string(),
                operation: "any (system is disabled)".to_string(),
            });
        }
        Ok(config)
    }
}

/// Per-item results of a native batch call
///
/// Accepts a bare array or an object carrying `results` or `items`; anything
/// else is treated as a single result.
fn batch_results(raw: Value) -> Vec<Value> {
    match raw {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["results", "items"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            vec![Value::Object(map)]
        }
        other => vec![other],
    }
}

fn webhook_event_type(payload: &Value) -> Option<String> {
    ["event_type", "type", "event"]
        .iter()
        .find_map(|k| payload.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}
