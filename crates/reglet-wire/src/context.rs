//! [`ContextWire`]: the cancellation/deadline envelope attached to every
//! guest-to-host call.

use serde::{Deserialize, Serialize};

/// Carries cancellation and timing information across the sandbox boundary.
/// `deadline` is preferred over `timeout_ms` when both are present (§4.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextWire {
    #[serde(default)]
    pub canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ContextWire {
    pub fn canceled() -> Self {
        Self { canceled: true, deadline: None, timeout_ms: None }
    }

    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        Self { canceled: false, deadline: None, timeout_ms: Some(timeout_ms) }
    }

    /// Resolves the effective timeout, preferring `deadline` over `timeout_ms`
    /// as specified, and taking the tighter of (this timeout, `parent_budget`)
    /// when both are present.
    pub fn effective_timeout(&self, parent_budget: Option<std::time::Duration>) -> Option<std::time::Duration> {
        let own = if let Some(deadline) = self.deadline {
            let remaining = deadline - chrono::Utc::now();
            Some(remaining.to_std().unwrap_or(std::time::Duration::ZERO))
        } else {
            self.timeout_ms.map(std::time::Duration::from_millis)
        };
        match (own, parent_budget) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canceled_context_is_canceled() {
        assert!(ContextWire::canceled().canceled);
    }

    #[test]
    fn prefers_tighter_of_own_and_parent_timeout() {
        let ctx = ContextWire::with_timeout_ms(5_000);
        let tighter = ctx.effective_timeout(Some(std::time::Duration::from_millis(1_000)));
        assert_eq!(tighter, Some(std::time::Duration::from_millis(1_000)));
    }

    #[test]
    fn falls_back_to_parent_budget_when_no_own_timeout() {
        let ctx = ContextWire::default();
        let budget = Some(std::time::Duration::from_secs(3));
        assert_eq!(ctx.effective_timeout(budget), budget);
    }
}
