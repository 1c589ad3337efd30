//! Already-parsed profile/control/observation definitions. Profile YAML
//! syntax is an external collaborator's concern; the scheduler only needs
//! these plain structs, produced upstream however the embedder likes.

use std::collections::BTreeSet;

use reglet_types::Severity;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct ObservationDefinition {
    pub plugin: String,
    pub config: Map<String, Value>,
    /// Opaque expectation expressions, handed to the injected evaluator
    /// alongside the plugin's evidence.
    pub expectations: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ControlDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub severity: Option<Severity>,
    pub tags: BTreeSet<String>,
    pub observations: Vec<ObservationDefinition>,
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub version: String,
    pub controls: Vec<ControlDefinition>,
}
