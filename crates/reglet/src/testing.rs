//! Fixture builders for constructing valid result aggregates without going
//! through the scheduler: small builder-style test helpers in place of
//! fixture files.

use std::collections::BTreeSet;

use chrono::Utc;
use reglet_types::{
    ControlResult, Evidence, ExecutionId, ExecutionResult, ExpectationResult, ObservationResult, Severity, Status,
    Summary,
};

#[derive(Debug, Clone)]
pub struct ControlResultBuilder {
    control: ControlResult,
}

impl ControlResultBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            control: ControlResult {
                name: id.clone(),
                id,
                description: String::new(),
                severity: None,
                tags: BTreeSet::new(),
                status: Status::Pass,
                message: String::new(),
                skip_reason: None,
                index: 0,
                duration_ms: 0,
                observations: vec![],
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.control.name = name.into();
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.control.severity = Some(severity);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.control.tags.insert(tag.into());
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.control.index = index;
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.control.status = status;
        self
    }

    pub fn skip_reason(mut self, reason: impl Into<String>) -> Self {
        self.control.skip_reason = Some(reason.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.control.message = message.into();
        self
    }

    pub fn observation(mut self, observation: ObservationResult) -> Self {
        self.control.observations.push(observation);
        self
    }

    pub fn build(self) -> ControlResult {
        self.control
    }
}

/// Minimal passing observation for a given plugin, with no evidence attached.
pub fn observation(plugin: impl Into<String>, status: Status) -> ObservationResult {
    ObservationResult {
        plugin: plugin.into(),
        config: Default::default(),
        status,
        evidence: None,
        evidence_meta: None,
        error: None,
        expectations: vec![],
        duration_ms: 0,
    }
}

/// An observation carrying `evidence` and the given expectation results.
pub fn observation_with_evidence(
    plugin: impl Into<String>,
    status: Status,
    evidence: Evidence,
    expectations: Vec<ExpectationResult>,
) -> ObservationResult {
    ObservationResult {
        plugin: plugin.into(),
        config: Default::default(),
        status,
        evidence: Some(evidence),
        evidence_meta: None,
        error: None,
        expectations,
        duration_ms: 0,
    }
}

pub struct ExecutionResultBuilder {
    result: ExecutionResult,
}

impl ExecutionResultBuilder {
    pub fn new(profile_name: impl Into<String>) -> Self {
        Self {
            result: ExecutionResult {
                execution_id: ExecutionId::new(),
                profile_name: profile_name.into(),
                profile_version: "1".to_string(),
                runtime_version: env!("CARGO_PKG_VERSION").to_string(),
                start_time: Utc::now(),
                end_time: None,
                duration_ms: None,
                version: 0,
                controls: vec![],
                summary: None,
            },
        }
    }

    pub fn control(mut self, control: ControlResult) -> Self {
        self.result.controls.push(control);
        self
    }

    /// Sorts by index, stamps `end_time`/`duration_ms`, and computes the
    /// summary counts — the same shape `ExecutionAggregate::finalize` produces.
    pub fn finalize(mut self) -> ExecutionResult {
        self.result.controls.sort_by_key(|c| c.index);
        self.result.end_time = Some(Utc::now());
        self.result.duration_ms = Some(0);

        let mut summary = Summary { total_controls: self.result.controls.len(), ..Summary::default() };
        for control in &self.result.controls {
            match control.status {
                Status::Pass => summary.passed += 1,
                Status::Fail => summary.failed += 1,
                Status::Error => summary.error += 1,
                Status::Skipped => summary.skipped += 1,
            }
            summary.total_observations += control.observations.len();
        }
        self.result.summary = Some(summary);
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_produces_sorted_finalized_result() {
        let result = ExecutionResultBuilder::new("baseline")
            .control(ControlResultBuilder::new("c2").index(2).status(Status::Fail).build())
            .control(ControlResultBuilder::new("c1").index(1).status(Status::Pass).build())
            .finalize();

        let ids: Vec<&str> = result.controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        let summary = result.summary.unwrap();
        assert_eq!(summary.total_controls, 2);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
    }
}
