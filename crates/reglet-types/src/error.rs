//! Error types: [`PluginError`] (data carried inside results) and
//! [`RegletError`] (propagated Rust errors for run-aborting failures).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`PluginError`], used by the status aggregator
/// and by formatters to pick a severity mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginErrorType {
    Config,
    Auth,
    Network,
    Timeout,
    Security,
    Internal,
}

/// A structured error produced by a plugin or by the host on its behalf.
///
/// Unlike [`RegletError`], this is plain data: it lives inside
/// `ObservationResult::error` and is serialized verbatim into every output
/// format, so it derives `Serialize`/`Deserialize` rather than `thiserror::Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginError {
    pub code: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: PluginErrorType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapped: Option<Box<PluginError>>,
}

impl PluginError {
    pub fn new(code: impl Into<String>, message: impl Into<String>, kind: PluginErrorType) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            kind,
            wrapped: None,
        }
    }

    pub fn wrapping(mut self, inner: PluginError) -> Self {
        self.wrapped = Some(Box::new(inner));
        self
    }

    pub fn capability_denied(message: impl Into<String>) -> Self {
        Self::new("capability_denied", message, PluginErrorType::Security)
    }

    pub fn guest_trap(message: impl Into<String>) -> Self {
        Self::new("guest_trap", message, PluginErrorType::Internal)
    }
}

impl std::fmt::Display for PluginError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, kind_tag(self.kind), self.message)
    }
}

impl std::error::Error for PluginError {}

fn kind_tag(kind: PluginErrorType) -> &'static str {
    match kind {
        PluginErrorType::Config => "config",
        PluginErrorType::Auth => "auth",
        PluginErrorType::Network => "network",
        PluginErrorType::Timeout => "timeout",
        PluginErrorType::Security => "security",
        PluginErrorType::Internal => "internal",
    }
}

/// Run-aborting failures that propagate as ordinary Rust errors rather than
/// being transcribed into a result. Per-observation failures never use this
/// type — they stay data, carried as [`PluginError`].
#[derive(Debug, Error)]
pub enum RegletError {
    #[error("failed to compile plugin module {name:?}: {source}")]
    PluginCompileFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed plugin manifest: {0}")]
    MalformedManifest(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("unsupported output format {0:?}; supported: {1:?}")]
    UnsupportedFormat(String, Vec<&'static str>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plugin_error_display_includes_code_type_message() {
        let err = PluginError::new("dns_failure", "lookup timed out", PluginErrorType::Timeout);
        assert_eq!(err.to_string(), "dns_failure (timeout): lookup timed out");
    }

    #[test]
    fn capability_denied_is_security_typed() {
        let err = PluginError::capability_denied("port 25 not permitted");
        assert_eq!(err.kind, PluginErrorType::Security);
        assert_eq!(err.code, "capability_denied");
    }

    #[test]
    fn wrapped_error_round_trips_through_json() {
        let inner = PluginError::new("econnrefused", "connection refused", PluginErrorType::Network);
        let outer = PluginError::new("probe_failed", "tcp probe failed", PluginErrorType::Internal)
            .wrapping(inner.clone());
        let json = serde_json::to_string(&outer).unwrap();
        let back: PluginError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.wrapped.unwrap().as_ref(), &inner);
    }

    #[test]
    fn unsupported_format_lists_supported() {
        let err = RegletError::UnsupportedFormat("xml".into(), vec!["table", "json", "yaml", "junit", "sarif"]);
        assert!(err.to_string().contains("xml"));
        assert!(err.to_string().contains("sarif"));
    }
}
