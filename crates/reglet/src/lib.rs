//! Reglet: a compliance-check engine that runs user-authored profiles by
//! delegating probe logic to sandboxed WebAssembly plugins. This crate is a
//! thin facade over the component crates; see each for its own details.

pub mod testing;

pub use reglet_capability::{glob_match, CapabilitySet};
pub use reglet_config::{PluginResourceConfig, RedactionConfig, RegletConfig, SchedulerConfig, TruncationConfig};
pub use reglet_evidence::{truncate_evidence, GreedyTruncator, TruncationStrategy};
pub use reglet_format::{formatter, FormatError, FormatOptions, Formatter};
pub use reglet_redact::{Config as RedactorConfig, Redactor};
pub use reglet_result::{control_status, observation_status, ExecutionAggregate};
pub use reglet_runtime::{Metadata as PluginMetadata, PluginRuntime};
pub use reglet_scheduler::{run, AlwaysPass, ControlDefinition, ExpectationEvaluator, ObservationDefinition, Profile, RunOptions};
pub use reglet_types::{
    Capability, CapabilityKind, ControlResult, Evidence, EvidenceMeta, ExecutionId, ExecutionResult,
    ExpectationResult, ObservationResult, PluginError, PluginErrorType, RegletError, Severity, Status, Summary,
};
pub use reglet_wire::{pack, unpack, ContextWire, ErrorDetail, EvidenceEnvelope};
