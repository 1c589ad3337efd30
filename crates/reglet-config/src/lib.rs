//! `RegletConfig` (§4.11): the single process-wide settings object this
//! core owns. Loaded from TOML the same way the rest of the workspace does.

use reglet_types::RegletError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { concurrency: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginResourceConfig {
    pub fuel: u64,
    pub memory_pages: u32,
    pub table_elements: u32,
    pub timeout_secs: u64,
}

impl Default for PluginResourceConfig {
    fn default() -> Self {
        let defaults = reglet_runtime::PluginConfig::default();
        Self {
            fuel: defaults.fuel,
            memory_pages: defaults.memory_pages,
            table_elements: defaults.table_elements,
            timeout_secs: defaults.timeout_secs,
        }
    }
}

impl PluginResourceConfig {
    /// Clamps this config's requested values against the runtime's hard
    /// ceilings, the same clamp `reglet-runtime` applies at plugin load time.
    pub fn clamped(&self) -> reglet_runtime::PluginConfig {
        reglet_runtime::PluginConfig::from_requested(self.fuel, self.memory_pages, self.table_elements, self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TruncationConfig {
    pub limit_bytes: usize,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self { limit_bytes: 1024 * 1024 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactionConfig {
    pub hash_mode: bool,
    pub salt: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegletConfig {
    pub scheduler: SchedulerConfig,
    pub plugin: PluginResourceConfig,
    pub truncation: TruncationConfig,
    pub redaction: RedactionConfig,
}

impl RegletConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, RegletError> {
        toml::from_str(text).map_err(|e| RegletError::MalformedManifest(e.to_string()))
    }

    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, RegletError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = RegletConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: RegletConfig = RegletConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config = RegletConfig::from_toml_str("[scheduler]\nconcurrency = 2\n").unwrap();
        assert_eq!(config.scheduler.concurrency, 2);
        assert_eq!(config.truncation.limit_bytes, 1024 * 1024);
    }

    #[test]
    fn plugin_resource_config_clamps_against_hard_ceilings() {
        let config = PluginResourceConfig { fuel: u64::MAX, memory_pages: u32::MAX, table_elements: u32::MAX, timeout_secs: 5 };
        let clamped = config.clamped();
        assert_eq!(clamped.fuel, reglet_runtime::MAX_FUEL_HARD);
        assert_eq!(clamped.memory_pages, reglet_runtime::MAX_MEMORY_HARD);
    }

    #[test]
    fn malformed_toml_is_a_malformed_manifest_error() {
        let err = RegletConfig::from_toml_str("not valid toml {{{").unwrap_err();
        assert!(matches!(err, RegletError::MalformedManifest(_)));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reglet.toml");
        std::fs::write(&path, "[redaction]\nhash_mode = true\nsalt = \"s\"\n").unwrap();
        let config = RegletConfig::from_toml_file(&path).unwrap();
        assert!(config.redaction.hash_mode);
        assert_eq!(config.redaction.salt, "s");
    }
}
