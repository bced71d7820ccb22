//! Per-call telemetry scope

use crate::adapters::monitoring::{MonitoringService, OperationEvent};
use crate::domain::{RequestContext, Result};
use std::sync::Arc;
use std::time::Instant;

/// Emits exactly one terminal [`OperationEvent`] for a gateway call
///
/// [`finish`](Self::finish) reports success or error. A scope dropped without
/// finishing (the caller cancelled the future) reports `cancelled`.
pub struct TelemetryScope {
    monitor: Arc<dyn MonitoringService>,
    system_id: String,
    operation: String,
    context: Option<RequestContext>,
    started: Instant,
}

impl TelemetryScope {
    pub fn start(
        monitor: Arc<dyn MonitoringService>,
        system_id: &str,
        operation: &str,
        context: RequestContext,
    ) -> Self {
        crate::log_operation_start!(system_id, operation, context.request_id);
        Self {
            monitor,
            system_id: system_id.to_string(),
            operation: operation.to_string(),
            context: Some(context),
            started: Instant::now(),
        }
    }

    /// Reports the outcome of the call
    pub fn finish<T>(mut self, result: &Result<T>) {
        let Some(context) = self.context.take() else {
            return;
        };
        let duration = self.started.elapsed();

        let event = match result {
            Ok(_) => OperationEvent::success(&self.system_id, &self.operation, duration, context),
            Err(e) => OperationEvent::failure(&self.system_id, &self.operation, duration, context, e),
        };
        self.monitor.log_operation(&event);
    }
}

impl Drop for TelemetryScope {
    fn drop(&mut self) {
        if let Some(context) = self.context.take() {
            let event = OperationEvent::cancelled(
                &self.system_id,
                &self.operation,
                self.started.elapsed(),
                context,
            );
            self.monitor.log_operation(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::monitoring::{HealthReport, OperationStatus, WebhookEvent};
    use crate::domain::GatewayError;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<OperationEvent>>);

    impl MonitoringService for Recorder {
        fn log_operation(&self, event: &OperationEvent) {
            self.0.lock().push(event.clone());
        }
        fn log_webhook_event(&self, _: &WebhookEvent) {}
        fn log_health_check(&self, _: &HealthReport) {}
    }

    fn statuses(recorder: &Recorder) -> Vec<OperationStatus> {
        recorder.0.lock().iter().map(|e| e.status).collect()
    }

    #[test]
    fn test_one_event_per_exit_path() {
        let recorder = Arc::new(Recorder::default());
        let monitor: Arc<dyn MonitoringService> = recorder.clone();

        TelemetryScope::start(monitor.clone(), "s1", "query", RequestContext::new())
            .finish(&Ok::<_, GatewayError>(()));
        TelemetryScope::start(monitor.clone(), "s1", "query", RequestContext::new())
            .finish(&Err::<(), _>(GatewayError::NotFound("x".into())));
        drop(TelemetryScope::start(monitor, "s1", "query", RequestContext::new()));

        assert_eq!(
            statuses(&recorder),
            vec![
                OperationStatus::Success,
                OperationStatus::Error,
                OperationStatus::Cancelled
            ]
        );
        assert_eq!(recorder.0.lock()[1].error_kind, Some("NOT_FOUND"));
    }
}
