//! Evidence model and size-bounded truncation.

pub mod truncator;

pub use reglet_types::{Evidence, EvidenceMeta};
pub use truncator::{GreedyTruncator, TruncationStrategy, DEFAULT_LIMIT_BYTES};

/// Applies a truncation strategy to one piece of evidence's `data`, returning
/// the (possibly truncated) evidence alongside its truncation metadata.
pub fn truncate_evidence(
    strategy: &dyn TruncationStrategy,
    evidence: Evidence,
    limit: usize,
) -> (Evidence, Option<EvidenceMeta>) {
    let (data, meta) = strategy.truncate(&evidence.data, limit);
    (Evidence { data, ..evidence }, meta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn truncate_evidence_reports_meta_only_when_truncated() {
        let evidence = Evidence {
            timestamp: Utc::now(),
            status: true,
            data: match json!({"large": "a".repeat(10_000)}) {
                serde_json::Value::Object(m) => m,
                _ => unreachable!(),
            },
            raw: None,
            error: None,
        };
        let (truncated, meta) = truncate_evidence(&GreedyTruncator, evidence, 500);
        assert!(meta.is_some());
        assert!(truncated.data["large"].as_str().unwrap().len() < 10_000);
    }
}
