//! Caller context carried through a gateway call

use super::ids::RequestId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Who is calling and why
///
/// Passed through to telemetry unchanged. A request id is generated when the
/// caller supplies none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Correlation id for logs and telemetry
    #[serde(default)]
    pub request_id: RequestId,

    /// Calling user, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Free-form caller metadata
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl RequestContext {
    /// Context with a fresh request id
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a caller-chosen request id
    pub fn with_request_id(request_id: impl Into<RequestId>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Self::default()
        }
    }

    /// Sets the user id
    pub fn user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Adds a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contexts_get_distinct_ids() {
        assert_ne!(RequestContext::new().request_id, RequestContext::new().request_id);
    }

    #[test]
    fn test_deserialize_without_request_id_generates_one() {
        let ctx: RequestContext = serde_json::from_str(r#"{"user_id":"u1"}"#).unwrap();
        assert!(!ctx.request_id.as_str().is_empty());
        assert_eq!(ctx.user_id.as_deref(), Some("u1"));
    }

    #[test]
    fn test_builder() {
        let ctx = RequestContext::with_request_id("req-7")
            .user("ann")
            .with_metadata("tenant", Value::from("acme"));
        assert_eq!(ctx.request_id.as_str(), "req-7");
        assert_eq!(ctx.metadata["tenant"], "acme");
    }
}
