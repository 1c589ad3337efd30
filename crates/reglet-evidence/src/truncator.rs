//! Size-bounded evidence truncation. Ships exactly one strategy,
//! `GreedyTruncator`, behind the [`TruncationStrategy`] trait so an embedder
//! can substitute another without touching the status aggregator or the
//! result aggregate.

use reglet_types::EvidenceMeta;
use serde_json::Value;

/// Default truncation limit: 1 MiB.
pub const DEFAULT_LIMIT_BYTES: usize = 1024 * 1024;

pub trait TruncationStrategy {
    /// Truncates `data` to fit within `limit` bytes of canonical JSON
    /// encoding, returning the (possibly unmodified) copy and, only when
    /// truncation actually occurred, the describing metadata. Never mutates
    /// its input.
    fn truncate(
        &self,
        data: &serde_json::Map<String, Value>,
        limit: usize,
    ) -> (serde_json::Map<String, Value>, Option<EvidenceMeta>);
}

/// Truncates top-level fields independently: oversized strings are clipped
/// with a `[TRUNCATED]` suffix; oversized complex values are replaced with a
/// small sentinel object naming their original type.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreedyTruncator;

const TRUNCATION_SUFFIX: &str = "\n... [TRUNCATED] ...";

impl TruncationStrategy for GreedyTruncator {
    fn truncate(
        &self,
        data: &serde_json::Map<String, Value>,
        limit: usize,
    ) -> (serde_json::Map<String, Value>, Option<EvidenceMeta>) {
        if limit == 0 {
            return (data.clone(), None);
        }

        let original_size = encoded_size(data);
        if original_size <= limit {
            return (data.clone(), None);
        }

        let half = limit / 2;
        let mut out = data.clone();
        for (_, value) in out.iter_mut() {
            match value {
                Value::String(s) if s.len() > half => {
                    let clipped: String = s.chars().take(half).collect();
                    *value = Value::String(format!("{clipped}{TRUNCATION_SUFFIX}"));
                }
                other @ (Value::Object(_) | Value::Array(_)) => {
                    if encoded_size_value(other) > half {
                        *value = sentinel_for(other);
                    }
                }
                _ => {}
            }
        }

        let meta = EvidenceMeta {
            truncated: true,
            original_size_bytes: original_size,
            truncated_at_bytes: limit,
            reason: "evidence exceeded size limit".to_string(),
        };
        (out, Some(meta))
    }
}

fn type_tag(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "bool",
        Value::Null => "null",
    }
}

fn sentinel_for(value: &Value) -> Value {
    serde_json::json!({
        "_truncated": "value exceeded size limit",
        "_type": type_tag(value),
    })
}

fn encoded_size(data: &serde_json::Map<String, Value>) -> usize {
    serde_json::to_string(data).map(|s| s.len()).unwrap_or(usize::MAX)
}

fn encoded_size_value(value: &Value) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn zero_limit_returns_input_unchanged() {
        let data = map(json!({"a": "b"}));
        let (out, meta) = GreedyTruncator.truncate(&data, 0);
        assert_eq!(out, data);
        assert!(meta.is_none());
    }

    #[test]
    fn input_under_limit_returned_unchanged() {
        let data = map(json!({"small": "val"}));
        let (out, meta) = GreedyTruncator.truncate(&data, 1_000_000);
        assert_eq!(out, data);
        assert!(meta.is_none());
    }

    #[test]
    fn truncate_does_not_mutate_input() {
        let data = map(json!({"small": "val", "large": "a".repeat(1000)}));
        let before = data.clone();
        let _ = GreedyTruncator.truncate(&data, 500);
        assert_eq!(data, before);
    }

    #[test]
    fn truncation_boundary_scenario() {
        let data = map(json!({"small": "val", "large": "a".repeat(1000)}));
        let (out, meta) = GreedyTruncator.truncate(&data, 500);
        assert_eq!(out["small"], "val");
        let large = out["large"].as_str().unwrap();
        assert!(large.starts_with(&"a".repeat(250)));
        assert!(large.ends_with("[TRUNCATED] ..."));
        assert_eq!(large.chars().take_while(|&c| c == 'a').count(), 250);
        let meta = meta.unwrap();
        assert!(meta.original_size_bytes > 500);
        assert_eq!(meta.truncated_at_bytes, 500);
        assert!(meta.truncated);
    }

    #[test]
    fn oversized_complex_value_becomes_sentinel() {
        let big_array: Vec<i32> = (0..10_000).collect();
        let data = map(json!({"ports": big_array}));
        let (out, meta) = GreedyTruncator.truncate(&data, 500);
        assert_eq!(out["ports"]["_type"], "array");
        assert_eq!(out["ports"]["_truncated"], "value exceeded size limit");
        assert!(meta.is_some());
    }

    #[test]
    fn result_size_never_exceeds_limit_plus_overhead() {
        for limit in [10usize, 100, 500, 2000] {
            let data = map(json!({"large": "x".repeat(5000)}));
            let (out, _) = GreedyTruncator.truncate(&data, limit);
            let size = encoded_size(&out);
            // Per-field clipping bounds each field independently; the whole
            // object can exceed `limit` by the fixed envelope/suffix overhead,
            // but never balloons back toward the original size.
            assert!(size < 5000);
        }
    }
}
