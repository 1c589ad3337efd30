//! The thread-safe execution-result aggregate the scheduler's workers
//! mutate concurrently: one `Mutex`-guarded `Vec`, append-only until
//! `finalize`.

use std::sync::Mutex;

use chrono::Utc;
use reglet_types::{ControlResult, ExecutionId, ExecutionResult, Status, Summary};

/// The live, mutable aggregate. `ExecutionResult` (in `reglet-types`) is its
/// frozen, serializable snapshot, produced once by [`ExecutionAggregate::finalize`].
pub struct ExecutionAggregate {
    execution_id: ExecutionId,
    profile_name: String,
    profile_version: String,
    runtime_version: String,
    start_time: chrono::DateTime<Utc>,
    controls: Mutex<Vec<ControlResult>>,
    version: Mutex<u64>,
}

impl ExecutionAggregate {
    pub fn new(profile_name: impl Into<String>, profile_version: impl Into<String>, runtime_version: impl Into<String>) -> Self {
        Self {
            execution_id: ExecutionId::new(),
            profile_name: profile_name.into(),
            profile_version: profile_version.into(),
            runtime_version: runtime_version.into(),
            start_time: Utc::now(),
            controls: Mutex::new(Vec::new()),
            version: Mutex::new(0),
        }
    }

    pub fn execution_id(&self) -> ExecutionId {
        self.execution_id
    }

    /// Appends a finished control under mutual exclusion.
    pub fn append_control(&self, control: ControlResult) {
        self.controls.lock().unwrap().push(control);
    }

    /// Returns the status of the control with `id`, if one has been appended.
    pub fn get_control_status(&self, id: &str) -> Option<Status> {
        self.controls.lock().unwrap().iter().find(|c| c.id == id).map(|c| c.status)
    }

    /// Returns a clone of the control with `id`, if one has been appended.
    pub fn get_control(&self, id: &str) -> Option<ControlResult> {
        self.controls.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }

    /// True once at least `expected` controls have been appended.
    pub fn is_complete(&self, expected: usize) -> bool {
        self.controls.lock().unwrap().len() >= expected
    }

    pub fn version(&self) -> u64 {
        *self.version.lock().unwrap()
    }

    pub fn increment_version(&self) -> u64 {
        let mut v = self.version.lock().unwrap();
        *v += 1;
        *v
    }

    /// Sorts controls by definition index, computes the summary, and
    /// returns the frozen snapshot. Must be called exactly once; the
    /// aggregate is not usable for further mutation afterward.
    pub fn finalize(self) -> ExecutionResult {
        let end_time = Utc::now();
        let duration_ms = (end_time - self.start_time).num_milliseconds().max(0) as u64;

        let mut controls = self.controls.into_inner().unwrap();
        controls.sort_by_key(|c| c.index);

        let summary = compute_summary(&controls);

        ExecutionResult {
            execution_id: self.execution_id,
            profile_name: self.profile_name,
            profile_version: self.profile_version,
            runtime_version: self.runtime_version,
            start_time: self.start_time,
            end_time: Some(end_time),
            duration_ms: Some(duration_ms),
            version: *self.version.lock().unwrap(),
            controls,
            summary: Some(summary),
        }
    }
}

fn compute_summary(controls: &[ControlResult]) -> Summary {
    let mut summary = Summary { total_controls: controls.len(), ..Summary::default() };
    for control in controls {
        match control.status {
            Status::Pass => summary.passed += 1,
            Status::Fail => summary.failed += 1,
            Status::Error => summary.error += 1,
            Status::Skipped => summary.skipped += 1,
        }
        summary.total_observations += control.observations.len();
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control(id: &str, index: usize, status: Status) -> ControlResult {
        ControlResult {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            severity: None,
            tags: Default::default(),
            status,
            message: String::new(),
            skip_reason: None,
            index,
            duration_ms: 0,
            observations: vec![],
        }
    }

    #[test]
    fn append_then_get_control_status() {
        let agg = ExecutionAggregate::new("baseline", "1", "0.1.0");
        agg.append_control(control("c1", 0, Status::Pass));
        assert_eq!(agg.get_control_status("c1"), Some(Status::Pass));
        assert_eq!(agg.get_control_status("missing"), None);
    }

    #[test]
    fn is_complete_counts_appended_controls() {
        let agg = ExecutionAggregate::new("baseline", "1", "0.1.0");
        assert!(!agg.is_complete(1));
        agg.append_control(control("c1", 0, Status::Pass));
        assert!(agg.is_complete(1));
    }

    #[test]
    fn increment_version_is_monotonic() {
        let agg = ExecutionAggregate::new("baseline", "1", "0.1.0");
        assert_eq!(agg.version(), 0);
        assert_eq!(agg.increment_version(), 1);
        assert_eq!(agg.increment_version(), 2);
        assert_eq!(agg.version(), 2);
    }

    #[test]
    fn finalize_sorts_by_index_and_computes_summary() {
        let agg = ExecutionAggregate::new("baseline", "1", "0.1.0");
        agg.append_control(control("c2", 2, Status::Fail));
        agg.append_control(control("c1", 1, Status::Pass));
        agg.append_control(control("c0", 0, Status::Error));

        let result = agg.finalize();
        let ids: Vec<&str> = result.controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2"]);

        let summary = result.summary.unwrap();
        assert_eq!(summary.total_controls, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.error, 1);
        assert_eq!(summary.skipped, 0);
        assert_eq!(summary.passed + summary.failed + summary.error + summary.skipped, summary.total_controls);
    }

    #[test]
    fn finalize_sets_end_time_and_duration() {
        let agg = ExecutionAggregate::new("baseline", "1", "0.1.0");
        agg.append_control(control("c1", 0, Status::Pass));
        let result = agg.finalize();
        assert!(result.end_time.is_some());
        assert!(result.duration_ms.is_some());
    }
}
