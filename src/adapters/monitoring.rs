//! Operational telemetry sink
//!
//! The gateway reports every call, webhook and health check to a
//! [`MonitoringService`]. Reporting is fire-and-forget: implementations must
//! not block and cannot fail the call being reported.

use crate::domain::{GatewayError, RequestContext};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Terminal status of a gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    Success,
    Error,
    /// The caller dropped the call before it finished
    Cancelled,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Success => write!(f, "success"),
            OperationStatus::Error => write!(f, "error"),
            OperationStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// One finished gateway call
#[derive(Debug, Clone, Serialize)]
pub struct OperationEvent {
    pub system_id: String,
    pub operation: String,
    pub status: OperationStatus,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    pub request_id: String,
    pub error: Option<String>,
    pub error_kind: Option<&'static str>,
    pub context: RequestContext,
}

impl OperationEvent {
    pub fn success(
        system_id: impl Into<String>,
        operation: impl Into<String>,
        duration: Duration,
        context: RequestContext,
    ) -> Self {
        Self {
            system_id: system_id.into(),
            operation: operation.into(),
            status: OperationStatus::Success,
            duration,
            request_id: context.request_id.to_string(),
            error: None,
            error_kind: None,
            context,
        }
    }

    pub fn failure(
        system_id: impl Into<String>,
        operation: impl Into<String>,
        duration: Duration,
        context: RequestContext,
        error: &GatewayError,
    ) -> Self {
        Self {
            status: OperationStatus::Error,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            ..Self::success(system_id, operation, duration, context)
        }
    }

    pub fn cancelled(
        system_id: impl Into<String>,
        operation: impl Into<String>,
        duration: Duration,
        context: RequestContext,
    ) -> Self {
        Self {
            status: OperationStatus::Cancelled,
            ..Self::success(system_id, operation, duration, context)
        }
    }
}

/// Inbound webhook outcome
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    pub system_id: String,
    pub event_type: Option<String>,
    pub verified: bool,
    pub payload_bytes: usize,
    pub request_id: String,
}

/// Result of probing one system
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub system_id: String,
    pub connected: bool,
    pub breaker_state: String,
    pub failure_count: u32,
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.connected && self.error.is_none() && self.breaker_state != "open"
    }
}

/// Sink for gateway telemetry
pub trait MonitoringService: Send + Sync {
    fn log_operation(&self, event: &OperationEvent);

    fn log_webhook_event(&self, event: &WebhookEvent);

    fn log_health_check(&self, report: &HealthReport);
}

/// Writes telemetry as structured `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMonitor;

impl MonitoringService for TracingMonitor {
    fn log_operation(&self, event: &OperationEvent) {
        let duration_ms = event.duration.as_millis() as u64;
        match event.status {
            OperationStatus::Success => tracing::info!(
                system_id = %event.system_id,
                operation = %event.operation,
                request_id = %event.request_id,
                duration_ms,
                status = %event.status,
                "Gateway operation completed"
            ),
            OperationStatus::Error => tracing::error!(
                system_id = %event.system_id,
                operation = %event.operation,
                request_id = %event.request_id,
                duration_ms,
                status = %event.status,
                kind = event.error_kind.unwrap_or("UNKNOWN"),
                error = event.error.as_deref().unwrap_or_default(),
                "Gateway operation failed"
            ),
            OperationStatus::Cancelled => tracing::warn!(
                system_id = %event.system_id,
                operation = %event.operation,
                request_id = %event.request_id,
                duration_ms,
                status = %event.status,
                "Gateway operation cancelled"
            ),
        }
    }

    fn log_webhook_event(&self, event: &WebhookEvent) {
        if event.verified {
            tracing::info!(
                system_id = %event.system_id,
                event_type = event.event_type.as_deref().unwrap_or("unknown"),
                payload_bytes = event.payload_bytes,
                request_id = %event.request_id,
                "Webhook received"
            );
        } else {
            tracing::warn!(
                system_id = %event.system_id,
                payload_bytes = event.payload_bytes,
                request_id = %event.request_id,
                "Webhook rejected: invalid signature"
            );
        }
    }

    fn log_health_check(&self, report: &HealthReport) {
        tracing::info!(
            system_id = %report.system_id,
            connected = report.connected,
            breaker_state = %report.breaker_state,
            failure_count = report.failure_count,
            healthy = report.is_healthy(),
            error = report.error.as_deref().unwrap_or_default(),
            "Health check"
        );
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
