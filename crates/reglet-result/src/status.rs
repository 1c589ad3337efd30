//! Pure status-aggregation rules: observation status from expectations,
//! control status from its observations. Expectation evaluation itself is an
//! external collaborator's concern — this module only combines already-
//! evaluated results.

use reglet_types::{ExpectationResult, ObservationResult, Status};

/// Derives an observation's status from its error and expectation results.
/// An error always wins; otherwise every expectation must pass.
pub fn observation_status(error_present: bool, expectations: &[ExpectationResult]) -> Status {
    if error_present {
        return Status::Error;
    }
    if expectations.iter().all(|e| e.passed) {
        Status::Pass
    } else {
        Status::Fail
    }
}

/// Derives a control's status from its observations, per the precedence
/// error > skipped (only when *every* observation is skipped) > fail > pass.
pub fn control_status(observations: &[ObservationResult]) -> Status {
    if observations.iter().any(|o| o.status == Status::Error) {
        return Status::Error;
    }
    if !observations.is_empty() && observations.iter().all(|o| o.status == Status::Skipped) {
        return Status::Skipped;
    }
    if observations.iter().any(|o| o.status == Status::Fail) {
        return Status::Fail;
    }
    Status::Pass
}
