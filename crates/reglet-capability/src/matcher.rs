//! The capability matcher: `match(kind, concrete) -> bool` over a
//! [`reglet_types::Capability`] set, per the pattern grammars in [`crate::glob`].

use reglet_types::{Capability, CapabilityKind};

use crate::glob::glob_match;

/// A declared set of capabilities for one plugin. Matching is pure and
/// deterministic: the first capability of the right kind whose pattern
/// matches wins; an empty set denies everything.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySet {
    capabilities: Vec<Capability>,
}

impl CapabilitySet {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self { capabilities }
    }

    pub fn push(&mut self, capability: Capability) {
        self.capabilities.push(capability);
    }

    /// Returns true if any capability of `kind` permits `concrete`.
    pub fn is_match(&self, kind: CapabilityKind, concrete: &str) -> bool {
        self.capabilities
            .iter()
            .filter(|c| c.kind == kind)
            .any(|c| pattern_matches(kind, &c.pattern, concrete))
    }
}

fn pattern_matches(kind: CapabilityKind, pattern: &str, concrete: &str) -> bool {
    match kind {
        CapabilityKind::Network => network_matches(pattern, concrete),
        CapabilityKind::Fs => fs_matches(pattern, concrete),
        CapabilityKind::Exec => glob_match(pattern, concrete),
        CapabilityKind::Env => glob_match(pattern, concrete),
    }
}

/// `pattern`/`concrete` are both `<direction>:<port-spec-or-port>`.
fn network_matches(pattern: &str, concrete: &str) -> bool {
    let Some((pat_dir, pat_ports)) = pattern.split_once(':') else {
        return false;
    };
    let Some((con_dir, con_port)) = concrete.split_once(':') else {
        return false;
    };
    if pat_dir != "any" && pat_dir != con_dir {
        return false;
    }
    if pat_ports == "*" {
        return true;
    }
    pat_ports.split(',').any(|p| p.trim() == con_port.trim())
}

/// `pattern`/`concrete` are both `<op>:<path>`.
fn fs_matches(pattern: &str, concrete: &str) -> bool {
    let Some((pat_op, pat_glob)) = pattern.split_once(':') else {
        return false;
    };
    let Some((con_op, con_path)) = concrete.split_once(':') else {
        return false;
    };
    pat_op == con_op && glob_match(pat_glob, con_path)
}
