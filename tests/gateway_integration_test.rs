//! Integration tests for request routing through the gateway
//!
//! A mock downstream system records every call; a recording monitor captures
//! the telemetry the gateway emits.

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use switchyard::adapters::{
    AdapterFactory, FileRegistry, HealthReport, IntegrationSystem, MonitoringService,
    OperationEvent, OperationStatus, WebhookEvent,
};
use switchyard::core::breaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitState};
use switchyard::domain::{
    Credentials, Direction, GatewayError, IntegrationConfig, RequestContext, Result,
    SystemMetadata, TransformMode, TransformationRule,
};
use switchyard::security::{
    AuthProviderFactory, CredentialEncryptor, MasterKey, SecretStore, SecurityManager,
    SignatureAlgorithm, WebhookVerifier,
};
use switchyard::Gateway;

#[derive(Default)]
struct MockSystem {
    connected: AtomicBool,
    connects: AtomicUsize,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    response: Mutex<Option<Value>>,
    calls: Mutex<Vec<(String, Value, String)>>,
}

impl MockSystem {
    fn calls(&self) -> Vec<(String, Value, String)> {
        self.calls.lock().unwrap().clone()
    }

    fn respond_with(&self, value: Value) {
        *self.response.lock().unwrap() = Some(value);
    }
}

#[async_trait]
impl IntegrationSystem for MockSystem {
    async fn connect(&self) -> Result<bool> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(true)
    }

    async fn disconnect(&self) -> Result<bool> {
        Ok(self.connected.swap(false, Ordering::SeqCst))
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn execute(&self, operation: &str, params: Value, credentials: &Credentials) -> Result<Value> {
        self.calls.lock().unwrap().push((
            operation.to_string(),
            params.clone(),
            credentials.token().to_string(),
        ));

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) || params.get("fail") == Some(&json!(true)) {
            return Err(GatewayError::adapter("crm1", "downstream unavailable"));
        }

        let response = self.response.lock().unwrap().clone();
        Ok(response.unwrap_or(params))
    }
}

#[derive(Default)]
struct Recorder {
    operations: Mutex<Vec<OperationEvent>>,
    webhooks: Mutex<Vec<WebhookEvent>>,
    health: Mutex<Vec<HealthReport>>,
}

impl Recorder {
    fn operations(&self) -> Vec<OperationEvent> {
        self.operations.lock().unwrap().clone()
    }
}

impl MonitoringService for Recorder {
    fn log_operation(&self, event: &OperationEvent) {
        self.operations.lock().unwrap().push(event.clone());
    }

    fn log_webhook_event(&self, event: &WebhookEvent) {
        self.webhooks.lock().unwrap().push(event.clone());
    }

    fn log_health_check(&self, report: &HealthReport) {
        self.health.lock().unwrap().push(report.clone());
    }
}

struct Harness {
    gateway: Gateway,
    system: Arc<MockSystem>,
    builds: Arc<AtomicUsize>,
    monitor: Arc<Recorder>,
    security: Arc<SecurityManager>,
}

fn crm(system_id: &str) -> IntegrationConfig {
    IntegrationConfig::new(system_id, "mock", "Mock CRM")
        .with_auth_param("type", json!("api_key"))
        .with_auth_param("api_key", json!("k-1"))
}

fn harness_with(configs: Vec<IntegrationConfig>, breaker: CircuitBreakerConfig) -> Harness {
    let system = Arc::new(MockSystem::default());
    let monitor = Arc::new(Recorder::default());

    let encryptor = CredentialEncryptor::new(&MasterKey::generate()).unwrap();
    let security = Arc::new(SecurityManager::new(
        Arc::new(SecretStore::in_memory(encryptor)),
        AuthProviderFactory::default(),
    ));

    let builds = Arc::new(AtomicUsize::new(0));
    let shared = Arc::clone(&system);
    let counter = Arc::clone(&builds);
    let adapters = AdapterFactory::new().with_adapter("mock", move |_: &IntegrationConfig| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&shared) as Arc<dyn IntegrationSystem>)
    });

    let gateway = Gateway::new(
        Arc::new(FileRegistry::with_systems(configs)),
        Arc::new(adapters),
        Arc::clone(&security),
    )
    .with_breakers(Arc::new(CircuitBreakerRegistry::new(breaker)))
    .with_monitor(monitor.clone());

    Harness {
        gateway,
        system,
        builds,
        monitor,
        security,
    }
}

fn harness(configs: Vec<IntegrationConfig>) -> Harness {
    harness_with(configs, CircuitBreakerConfig::new(5, Duration::from_secs(60)))
}

#[tokio::test]
async fn test_unknown_system_is_not_found_and_reported() {
    let h = harness(vec![]);

    let err = h
        .gateway
        .route_request("missing", "query", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));

    let events = h.monitor.operations();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, OperationStatus::Error);
    assert_eq!(events[0].error_kind, Some("NOT_FOUND"));
}

#[tokio::test]
async fn test_route_request_transforms_both_directions() {
    let config = crm("crm1")
        .with_rule(
            TransformationRule::new("contact", Direction::Outbound)
                .with_mode(TransformMode::Selective)
                .map_field("firstName", "first_name"),
        )
        .with_rule(TransformationRule::new("contact", Direction::Inbound).map_field("Id", "id"));
    let h = harness(vec![config]);
    h.system.respond_with(json!({"_entity_type": "contact", "Id": "003"}));

    let result = h
        .gateway
        .route_request(
            "crm1",
            "get_contact",
            Some(json!({"_entity_type": "contact", "firstName": "Ann", "age": 40})),
            Some(RequestContext::with_request_id("req-42")),
        )
        .await
        .unwrap();

    let calls = h.system.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "get_contact");
    assert_eq!(calls[0].1, json!({"first_name": "Ann"}));
    assert_eq!(calls[0].2, "k-1");

    assert_eq!(result["id"], "003");
    assert_eq!(result["_metadata"]["source_system"], "crm1");
    assert_eq!(result["_metadata"]["source_system_type"], "mock");

    let events = h.monitor.operations();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, OperationStatus::Success);
    assert_eq!(events[0].request_id, "req-42");
    assert_eq!(h.system.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_params_become_empty_object() {
    let h = harness(vec![crm("crm1")]);

    h.gateway
        .route_request("crm1", "list", None, None)
        .await
        .unwrap();
    assert_eq!(h.system.calls()[0].1, json!({}));
}

#[tokio::test]
async fn test_disabled_system_is_rejected() {
    let mut config = crm("crm1");
    config.enabled = false;
    let h = harness(vec![config]);

    let err = h
        .gateway
        .route_request("crm1", "query", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedOperation { .. }));
    assert!(h.system.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_system_type_is_unsupported() {
    let h = harness(vec![IntegrationConfig::new("ftp1", "ftp", "FTP")]);

    let err = h
        .gateway
        .route_request("ftp1", "upload", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedSystemType(_)));
}

#[tokio::test]
async fn test_open_breaker_rejects_without_calling_downstream() {
    let h = harness_with(
        vec![crm("crm1")],
        CircuitBreakerConfig::new(2, Duration::from_secs(60)),
    );
    h.system.fail.store(true, Ordering::SeqCst);

    for _ in 0..2 {
        let err = h
            .gateway
            .route_request("crm1", "query", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Adapter { .. }));
    }

    let err = h
        .gateway
        .route_request("crm1", "query", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::CircuitOpen(_)));
    assert_eq!(h.system.calls().len(), 2);

    let events = h.monitor.operations();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2].error_kind, Some("CIRCUIT_OPEN"));

    let report = h.gateway.health_check("crm1").await.unwrap();
    assert_eq!(report.breaker_state, "open");
    assert!(!report.is_healthy());
}

#[tokio::test]
async fn test_breaker_recovers_after_successful_trial() {
    let h = harness_with(
        vec![crm("crm1")],
        CircuitBreakerConfig::new(1, Duration::from_millis(50)),
    );
    h.system.fail.store(true, Ordering::SeqCst);
    assert!(h.gateway.route_request("crm1", "query", None, None).await.is_err());

    let breaker = h.gateway.breakers().get("crm1").unwrap();
    assert_eq!(breaker.state(), CircuitState::Open);

    tokio::time::sleep(Duration::from_millis(80)).await;
    h.system.fail.store(false, Ordering::SeqCst);

    h.gateway
        .route_request("crm1", "query", None, None)
        .await
        .unwrap();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test]
async fn test_breakers_are_isolated_per_system() {
    let h = harness_with(
        vec![crm("crm1"), crm("crm2")],
        CircuitBreakerConfig::new(1, Duration::from_secs(60)),
    );
    h.system.fail.store(true, Ordering::SeqCst);
    assert!(h.gateway.route_request("crm1", "query", None, None).await.is_err());

    h.system.fail.store(false, Ordering::SeqCst);
    assert!(h.gateway.route_request("crm2", "query", None, None).await.is_ok());
    assert!(matches!(
        h.gateway.route_request("crm1", "query", None, None).await,
        Err(GatewayError::CircuitOpen(_))
    ));
}

#[tokio::test]
async fn test_concurrent_first_calls_share_one_adapter_and_breaker() {
    let h = harness(vec![crm("crm1")]);

    let calls = (0..16).map(|i| {
        h.gateway
            .route_request("crm1", "query", Some(json!({"n": i})), None)
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(h.builds.load(Ordering::SeqCst), 1);
    assert_eq!(h.system.connects.load(Ordering::SeqCst), 1);
    assert_eq!(h.gateway.breakers().len(), 1);
    assert_eq!(h.monitor.operations().len(), 16);
}

#[tokio::test]
async fn test_cancelled_request_is_reported_once() {
    let h = harness(vec![crm("crm1")]);
    *h.system.delay.lock().unwrap() = Some(Duration::from_secs(5));

    let outcome = tokio::time::timeout(
        Duration::from_millis(50),
        h.gateway.route_request("crm1", "slow", None, None),
    )
    .await;
    assert!(outcome.is_err());

    let events = h.monitor.operations();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, OperationStatus::Cancelled);
}

#[tokio::test]
async fn test_batch_without_native_support_aborts_on_first_failure() {
    let h = harness(vec![crm("crm1")]);

    let err = h
        .gateway
        .execute_batch(
            "crm1",
            "create",
            vec![json!({"n": 1}), json!({"n": 2, "fail": true}), json!({"n": 3})],
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Adapter { .. }));
    assert_eq!(h.system.calls().len(), 2);

    let events = h.monitor.operations();
    let last = events.last().unwrap();
    assert_eq!(last.operation, "batch_create");
    assert_eq!(last.status, OperationStatus::Error);
}

#[tokio::test]
async fn test_batch_without_native_support_keeps_order() {
    let h = harness(vec![crm("crm1")]);

    let results = h
        .gateway
        .execute_batch("crm1", "create", vec![json!({"n": 1}), json!({"n": 2})], None)
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["n"], 1);
    assert_eq!(results[1]["n"], 2);
}

#[tokio::test]
async fn test_native_batch_makes_one_call() {
    let config = crm("crm1").with_metadata(SystemMetadata {
        supports_batch: true,
        ..Default::default()
    });
    let h = harness(vec![config]);
    h.system
        .respond_with(json!({"results": [{"id": "a"}, {"id": "b"}]}));

    let results = h
        .gateway
        .execute_batch("crm1", "create", vec![json!({"n": 1}), json!({"n": 2})], None)
        .await
        .unwrap();

    let calls = h.system.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "batch_create");
    assert_eq!(calls[0].1, json!({"items": [{"n": 1}, {"n": 2}]}));

    assert_eq!(results.len(), 2);
    assert_eq!(results[1]["id"], "b");
    assert_eq!(results[1]["_metadata"]["source_system"], "crm1");
}

#[tokio::test]
async fn test_register_webhook_requires_support() {
    let h = harness(vec![crm("crm1")]);

    let err = h
        .gateway
        .register_webhook("crm1", "contact.created", "https://hooks.example.com/in", None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedOperation { .. }));
    assert!(h.system.calls().is_empty());
}

#[tokio::test]
async fn test_register_webhook_passes_params_untransformed() {
    let config = crm("crm1")
        .with_rule(TransformationRule::new("default", Direction::Outbound).remove_field("callback_url"))
        .with_metadata(SystemMetadata {
            supports_webhooks: true,
            ..Default::default()
        });
    let h = harness(vec![config]);

    h.gateway
        .register_webhook("crm1", "contact.created", "https://hooks.example.com/in", None)
        .await
        .unwrap();

    let calls = h.system.calls();
    assert_eq!(calls[0].0, "register_webhook");
    assert_eq!(
        calls[0].1,
        json!({"event_type": "contact.created", "callback_url": "https://hooks.example.com/in"})
    );
}

#[tokio::test]
async fn test_handle_webhook_verifies_and_normalizes() {
    let h = harness(vec![crm("crm1")]);
    h.security.store_webhook_secret("crm1", "abc").await.unwrap();

    let payload = br#"{"event_type":"contact.created","Id":"1"}"#;
    let signature = WebhookVerifier::sign(b"abc", payload, SignatureAlgorithm::Sha256);
    let headers = HashMap::from([("X-Signature".to_string(), format!("sha256={signature}"))]);

    let result = h
        .gateway
        .handle_webhook("crm1", payload, &headers, None)
        .await
        .unwrap();
    assert_eq!(result["Id"], "1");
    assert_eq!(result["_metadata"]["source_system"], "crm1");

    let webhooks = h.monitor.webhooks.lock().unwrap().clone();
    assert_eq!(webhooks.len(), 1);
    assert!(webhooks[0].verified);
    assert_eq!(webhooks[0].event_type.as_deref(), Some("contact.created"));
}

#[tokio::test]
async fn test_handle_webhook_rejects_bad_signature() {
    let h = harness(vec![crm("crm1")]);
    h.security.store_webhook_secret("crm1", "abc").await.unwrap();

    let headers = HashMap::from([("X-Signature".to_string(), "sha256=00ff".to_string())]);
    let err = h
        .gateway
        .handle_webhook("crm1", b"{}", &headers, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Auth(_)));

    let webhooks = h.monitor.webhooks.lock().unwrap().clone();
    assert!(!webhooks[0].verified);
}

#[tokio::test]
async fn test_health_check_connects_and_reports() {
    let h = harness(vec![crm("crm1")]);

    let report = h.gateway.health_check("crm1").await.unwrap();
    assert!(report.connected);
    assert_eq!(report.breaker_state, "closed");
    assert_eq!(report.failure_count, 0);
    assert!(report.is_healthy());
    assert_eq!(h.monitor.health.lock().unwrap().len(), 1);

    // Already connected
    h.gateway.health_check("crm1").await.unwrap();
    assert_eq!(h.system.connects.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_credentials_fail_with_auth_error() {
    let h = harness(vec![IntegrationConfig::new("crm1", "mock", "CRM")
        .with_auth_param("type", json!("basic"))]);

    let err = h
        .gateway
        .route_request("crm1", "query", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Auth(_)));
    assert!(h.system.calls().is_empty());
}
