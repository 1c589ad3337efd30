//! [`ErrorDetail`]: the wire-format error shape returned by host functions.
//!
//! Distinct from `reglet_types::PluginError` (the result-model error that
//! ends up in a finalized `ExecutionResult`) — this is the wire shape the
//! host hands back across the sandbox boundary; the plugin runtime converts
//! one into the other when it demarshals a host-function response.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    #[serde(default)]
    pub is_timeout: bool,
    #[serde(default)]
    pub is_not_found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<Box<ErrorDetail>>,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: kind.into(),
            code: code.into(),
            is_timeout: false,
            is_not_found: false,
            wrapped: None,
        }
    }

    pub fn capability_denied(message: impl Into<String>) -> Self {
        Self::new("security", "capability_denied", message)
    }

    pub fn canceled() -> Self {
        Self::new("timeout", "canceled", "context canceled").timeout()
    }

    pub fn timeout(mut self) -> Self {
        self.is_timeout = true;
        self
    }

    pub fn not_found(mut self) -> Self {
        self.is_not_found = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_denied_has_security_type() {
        let detail = ErrorDetail::capability_denied("port 25 not permitted");
        assert_eq!(detail.kind, "security");
        assert_eq!(detail.code, "capability_denied");
    }

    #[test]
    fn canceled_sets_timeout_flag() {
        assert!(ErrorDetail::canceled().is_timeout);
    }

    #[test]
    fn round_trips_through_json() {
        let detail = ErrorDetail::new("network", "econnrefused", "connection refused").not_found();
        let json = serde_json::to_string(&detail).unwrap();
        let back: ErrorDetail = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detail);
    }
}
