//! The result aggregate's data model: everything that crosses into a
//! finalized [`crate::ExecutionResult`] and out through a formatter.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PluginError;
use crate::id::ExecutionId;

/// Status shared by both controls and observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pass,
    Fail,
    Error,
    Skipped,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Error => "error",
            Status::Skipped => "skipped",
        }
    }
}

/// Severity a control declares for itself; `""` is modeled as `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// A capability kind, one of the four pattern grammars in the capability matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Network,
    Fs,
    Exec,
    Env,
}

/// A single declared permission: a kind plus a kind-specific pattern string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub kind: CapabilityKind,
    pub pattern: String,
}

impl Capability {
    pub fn new(kind: CapabilityKind, pattern: impl Into<String>) -> Self {
        Self { kind, pattern: pattern.into() }
    }
}

/// Describes how/whether evidence was truncated before being stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMeta {
    pub truncated: bool,
    pub original_size_bytes: usize,
    pub truncated_at_bytes: usize,
    pub reason: String,
}

/// A structured record of what a probe observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub timestamp: DateTime<Utc>,
    pub status: bool,
    #[serde(default)]
    pub data: serde_json::Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PluginError>,
}

/// The outcome of evaluating one expectation expression against evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub expression: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One probe invocation within a control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationResult {
    pub plugin: String,
    #[serde(default)]
    pub config: serde_json::Map<String, Value>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Evidence>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_meta: Option<EvidenceMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PluginError>,
    #[serde(default)]
    pub expectations: Vec<ExpectationResult>,
    pub duration_ms: u64,
}

/// One per control: the profile-declared check plus its computed status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlResult {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub status: Status,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
    pub index: usize,
    pub duration_ms: u64,
    pub observations: Vec<ObservationResult>,
}

/// Aggregate counts computed once at `Finalize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_controls: usize,
    pub passed: usize,
    pub failed: usize,
    pub error: usize,
    pub skipped: usize,
    pub total_observations: usize,
}

/// The frozen, serializable snapshot of an [`crate::ExecutionResult`] after
/// `Finalize`. The live, thread-safe aggregate type lives in `reglet-result`;
/// this type is its plain-data shadow, shared here so every crate (formatters
/// included) can depend on the data model without depending on the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    pub profile_name: String,
    pub profile_version: String,
    pub runtime_version: String,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    pub version: u64,
    pub controls: Vec<ControlResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}
