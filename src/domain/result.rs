//! Result type alias for Switchyard
//!
//! This module provides a convenient Result type alias that uses GatewayError
//! as the error type.

use super::errors::GatewayError;

/// Result type alias for Switchyard operations
///
/// # Examples
///
/// ```
/// use switchyard::domain::result::Result;
/// use switchyard::domain::errors::GatewayError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(GatewayError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, GatewayError>;
