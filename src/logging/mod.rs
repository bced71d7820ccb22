//! Logging and observability
//!
//! Structured logging built on `tracing`:
//! - human-readable console output
//! - optional JSON file output with rotation
//! - helper macros for recurring gateway events
//!
//! # Example
//!
//! ```no_run
//! use switchyard::logging::init_logging;
//! use switchyard::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(system_id = "sf1", "Gateway ready");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a routed operation
///
/// # Example
///
/// ```no_run
/// use switchyard::log_operation_start;
///
/// log_operation_start!("sf1", "get_contact", "req-123");
/// ```
#[macro_export]
macro_rules! log_operation_start {
    ($system_id:expr, $operation:expr, $request_id:expr) => {
        tracing::debug!(
            system_id = %$system_id,
            operation = %$operation,
            request_id = %$request_id,
            "Routing operation"
        );
    };
}

/// Log a circuit breaker state transition
///
/// # Example
///
/// ```no_run
/// use switchyard::log_breaker_transition;
///
/// log_breaker_transition!("sf1", "closed", "open", 5);
/// ```
#[macro_export]
macro_rules! log_breaker_transition {
    ($name:expr, $from:expr, $to:expr, $failures:expr) => {
        tracing::warn!(
            breaker = %$name,
            from = %$from,
            to = %$to,
            failure_count = $failures,
            "Circuit breaker state transition"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use switchyard::log_error_with_context;
/// use switchyard::domain::GatewayError;
///
/// let error = GatewayError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            kind = $error.kind(),
            context = $context,
            "Error occurred"
        );
    };
}
