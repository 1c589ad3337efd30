//! The control scheduler (§4.9): bounded-concurrency worker pool over an
//! independent set of controls, deterministic result assembly via
//! `reglet_result::ExecutionAggregate`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use reglet_result::{control_status, observation_status, ExecutionAggregate};
use reglet_runtime::PluginRuntime;
use reglet_types::{ControlResult, ExecutionResult, ObservationResult};
use reglet_wire::ContextWire;
use tokio_util::sync::CancellationToken;

use crate::definitions::{ControlDefinition, Profile};
use crate::evaluator::ExpectationEvaluator;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Max controls in flight; defaults to the host's CPU count.
    pub concurrency: usize,
    pub cancel: CancellationToken,
    pub runtime_version: String,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            cancel: CancellationToken::new(),
            runtime_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Runs every control in `profile`, bounded by `options.concurrency`, and
/// returns the finalized, deterministically-ordered result.
pub async fn run(
    profile: Profile,
    runtime: Arc<PluginRuntime>,
    evaluator: Arc<dyn ExpectationEvaluator>,
    options: RunOptions,
) -> ExecutionResult {
    let aggregate = Arc::new(ExecutionAggregate::new(profile.name, profile.version, options.runtime_version.clone()));
    let controls = Arc::new(profile.controls);
    let cursor = Arc::new(AtomicUsize::new(0));
    let concurrency = options.concurrency.max(1).min(controls.len().max(1));

    let mut workers = Vec::with_capacity(concurrency);
    for _ in 0..concurrency {
        let controls = Arc::clone(&controls);
        let cursor = Arc::clone(&cursor);
        let aggregate = Arc::clone(&aggregate);
        let runtime = Arc::clone(&runtime);
        let evaluator = Arc::clone(&evaluator);
        let cancel = options.cancel.clone();

        workers.push(tokio::spawn(async move {
            loop {
                let index = cursor.fetch_add(1, Ordering::SeqCst);
                if index >= controls.len() {
                    break;
                }
                let definition = controls[index].clone();

                let control_result = if cancel.is_cancelled() {
                    skipped_control(definition, index, "canceled")
                } else {
                    run_control(definition, index, &runtime, &evaluator, &cancel).await
                };
                aggregate.append_control(control_result);
            }
        }));
    }

    for worker in workers {
        let _ = worker.await;
    }

    Arc::try_unwrap(aggregate)
        .unwrap_or_else(|_| unreachable!("all worker handles joined before this point"))
        .finalize()
}

async fn run_control(
    definition: ControlDefinition,
    index: usize,
    runtime: &PluginRuntime,
    evaluator: &Arc<dyn ExpectationEvaluator>,
    cancel: &CancellationToken,
) -> ControlResult {
    let started = Instant::now();
    let mut observations = Vec::with_capacity(definition.observations.len());

    for obs in definition.observations {
        let obs_started = Instant::now();

        if cancel.is_cancelled() {
            observations.push(ObservationResult {
                plugin: obs.plugin,
                config: obs.config,
                status: reglet_types::Status::Skipped,
                evidence: None,
                evidence_meta: None,
                error: None,
                expectations: vec![],
                duration_ms: obs_started.elapsed().as_millis() as u64,
            });
            continue;
        }

        let ctx = if cancel.is_cancelled() { ContextWire::canceled() } else { ContextWire::default() };
        let config_value = serde_json::Value::Object(obs.config.clone());

        let outcome = runtime.check(&obs.plugin, &ctx, &config_value).await;

        let (status, evidence, error, expectations) = match outcome {
            Ok(evidence) => {
                let expectations: Vec<_> =
                    obs.expectations.iter().map(|expr| evaluator.evaluate(expr, Some(&evidence))).collect();
                let status = observation_status(false, &expectations);
                (status, Some(evidence), None, expectations)
            }
            Err(plugin_error) => (reglet_types::Status::Error, None, Some(plugin_error), vec![]),
        };

        observations.push(ObservationResult {
            plugin: obs.plugin,
            config: obs.config,
            status,
            evidence,
            evidence_meta: None,
            error,
            expectations,
            duration_ms: obs_started.elapsed().as_millis() as u64,
        });
    }

    let status = control_status(&observations);
    ControlResult {
        id: definition.id,
        name: definition.name,
        description: definition.description,
        severity: definition.severity,
        tags: definition.tags,
        status,
        message: String::new(),
        skip_reason: None,
        index,
        duration_ms: started.elapsed().as_millis() as u64,
        observations,
    }
}

fn skipped_control(definition: ControlDefinition, index: usize, reason: &str) -> ControlResult {
    ControlResult {
        id: definition.id,
        name: definition.name,
        description: definition.description,
        severity: definition.severity,
        tags: definition.tags,
        status: reglet_types::Status::Skipped,
        message: String::new(),
        skip_reason: Some(reason.to_string()),
        index,
        duration_ms: 0,
        observations: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::AlwaysPass;
    use std::collections::BTreeSet;

    fn control(id: &str) -> ControlDefinition {
        ControlDefinition {
            id: id.into(),
            name: id.into(),
            description: String::new(),
            severity: None,
            tags: BTreeSet::new(),
            observations: vec![],
        }
    }

    #[tokio::test]
    async fn cancellation_before_start_skips_remaining_controls() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let profile = Profile {
            name: "baseline".into(),
            version: "1".into(),
            controls: vec![control("c1"), control("c2")],
        };
        let runtime = Arc::new(PluginRuntime::new().unwrap());
        let result = run(
            profile,
            runtime,
            Arc::new(AlwaysPass),
            RunOptions { concurrency: 2, cancel, runtime_version: "0.1.0".into() },
        )
        .await;

        assert_eq!(result.controls.len(), 2);
        assert!(result.controls.iter().all(|c| c.status == reglet_types::Status::Skipped));
        assert!(result.controls.iter().all(|c| c.skip_reason.as_deref() == Some("canceled")));
    }

    #[tokio::test]
    async fn result_controls_are_sorted_by_definition_index_regardless_of_completion_order() {
        let profile = Profile {
            name: "baseline".into(),
            version: "1".into(),
            controls: (0..8).map(|i| control(&format!("c{i}"))).collect(),
        };
        let runtime = Arc::new(PluginRuntime::new().unwrap());
        let result = run(
            profile,
            runtime,
            Arc::new(AlwaysPass),
            RunOptions { concurrency: 4, cancel: CancellationToken::new(), runtime_version: "0.1.0".into() },
        )
        .await;

        let ids: Vec<&str> = result.controls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7"]);
    }

    #[tokio::test]
    async fn empty_profile_finalizes_with_zero_controls() {
        let profile = Profile { name: "baseline".into(), version: "1".into(), controls: vec![] };
        let runtime = Arc::new(PluginRuntime::new().unwrap());
        let result = run(
            profile,
            runtime,
            Arc::new(AlwaysPass),
            RunOptions::default(),
        )
        .await;
        assert_eq!(result.summary.unwrap().total_controls, 0);
    }
}
