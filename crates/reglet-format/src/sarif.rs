use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use reglet_types::{ControlResult, ExecutionResult, Severity, Status};
use serde::Serialize;

use crate::{FormatError, FormatOptions, Formatter};

const MAX_EMBEDDED_ARTIFACT_BYTES: u64 = 512 * 1024;

/// SARIF 2.1.0. Each control becomes a `reportingDescriptor` (rule); each
/// `ControlResult` becomes a `result`. Artifacts referenced from evidence are
/// deduplicated by normalized URI and embedded when small enough.
pub struct SarifFormatter {
    profile_path: Option<PathBuf>,
}

impl SarifFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { profile_path: options.profile_path }
    }
}

impl Formatter for SarifFormatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError> {
        let mut rules = Vec::with_capacity(result.controls.len());
        let mut results = Vec::with_capacity(result.controls.len());
        let mut artifacts: BTreeMap<String, Artifact> = BTreeMap::new();

        for control in &result.controls {
            rules.push(ReportingDescriptor {
                id: control.id.clone(),
                name: control.name.clone(),
                short_description: Message { text: control.description.clone() },
            });
            results.push(self.sarif_result(control, &mut artifacts));
        }

        let log = SarifLog {
            schema: "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json"
                .to_string(),
            version: "2.1.0".to_string(),
            runs: vec![Run {
                tool: Tool { driver: Driver { name: "reglet".to_string(), rules } },
                results,
                artifacts: artifacts.into_values().collect(),
            }],
        };

        serde_json::to_writer_pretty(&mut *writer, &log)?;
        writeln!(writer)?;
        Ok(())
    }
}

impl SarifFormatter {
    fn sarif_result(&self, control: &ControlResult, artifacts: &mut BTreeMap<String, Artifact>) -> SarifResult {
        let level = level_for(control.status, control.severity);
        let kind = kind_for(control.status);

        let location = control
            .observations
            .iter()
            .find_map(|o| o.evidence.as_ref())
            .and_then(|e| extract_location(e, &self.profile_path, artifacts));

        SarifResult {
            rule_id: control.id.clone(),
            level: level.to_string(),
            kind: kind.to_string(),
            message: Message { text: control.message.clone() },
            locations: location.into_iter().collect(),
        }
    }
}

fn level_for(status: Status, severity: Option<Severity>) -> &'static str {
    match status {
        Status::Pass => "note",
        Status::Error => "error",
        Status::Skipped => "none",
        Status::Fail => match severity {
            Some(Severity::Critical) | Some(Severity::High) => "error",
            Some(Severity::Medium) | Some(Severity::Low) | None => "warning",
        },
    }
}

fn kind_for(status: Status) -> &'static str {
    match status {
        Status::Pass => "pass",
        Status::Fail | Status::Error => "fail",
        Status::Skipped => "notApplicable",
    }
}

fn extract_location(
    evidence: &reglet_types::Evidence,
    profile_path: &Option<PathBuf>,
    artifacts: &mut BTreeMap<String, Artifact>,
) -> Option<Location> {
    let data = &evidence.data;
    let raw_path = data
        .get("path")
        .and_then(|v| v.as_str())
        .or_else(|| data.get("command_path").and_then(|v| v.as_str()))
        .or_else(|| {
            data.get("shell_command").and_then(|v| v.as_str()).filter(|s| {
                s.len() <= 255 && !s.chars().any(|c| c.is_whitespace() || c == ';')
            })
        })?;

    let uri = relativize(raw_path, profile_path);
    artifacts.entry(uri.clone()).or_insert_with(|| build_artifact(&uri, raw_path, profile_path));

    let region = Region {
        start_line: data.get("line").or_else(|| data.get("start_line")).and_then(|v| v.as_u64()),
        start_column: data.get("column").and_then(|v| v.as_u64()),
    };
    let has_region = region.start_line.is_some() || region.start_column.is_some();

    Some(Location {
        physical_location: PhysicalLocation {
            artifact_location: ArtifactLocation { uri },
            region: if has_region { Some(region) } else { None },
        },
    })
}

fn relativize(raw_path: &str, profile_path: &Option<PathBuf>) -> String {
    let Some(base) = profile_path else { return raw_path.to_string() };
    match Path::new(raw_path).strip_prefix(base) {
        Ok(relative) => relative.to_string_lossy().into_owned(),
        Err(_) => raw_path.to_string(),
    }
}

/// Embeds the artifact's contents if it's a regular file (not a symlink,
/// per the decision to never follow symlinks here) under the size cap.
fn build_artifact(uri: &str, raw_path: &str, profile_path: &Option<PathBuf>) -> Artifact {
    let full_path = match profile_path {
        Some(base) if !Path::new(raw_path).is_absolute() => base.join(raw_path),
        _ => PathBuf::from(raw_path),
    };

    let contents = std::fs::symlink_metadata(&full_path)
        .ok()
        .filter(|meta| meta.is_file() && meta.len() <= MAX_EMBEDDED_ARTIFACT_BYTES)
        .and_then(|_| std::fs::read_to_string(&full_path).ok())
        .map(|text| ArtifactContent { text });

    Artifact { location: ArtifactLocation { uri: uri.to_string() }, contents }
}

#[derive(Serialize)]
struct SarifLog {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<Run>,
}

#[derive(Serialize)]
struct Run {
    tool: Tool,
    results: Vec<SarifResult>,
    artifacts: Vec<Artifact>,
}

#[derive(Serialize)]
struct Tool {
    driver: Driver,
}

#[derive(Serialize)]
struct Driver {
    name: String,
    rules: Vec<ReportingDescriptor>,
}

#[derive(Serialize)]
struct ReportingDescriptor {
    id: String,
    name: String,
    #[serde(rename = "shortDescription")]
    short_description: Message,
}

#[derive(Serialize)]
struct Message {
    text: String,
}

#[derive(Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    kind: String,
    message: Message,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    locations: Vec<Location>,
}

#[derive(Serialize)]
struct Location {
    #[serde(rename = "physicalLocation")]
    physical_location: PhysicalLocation,
}

#[derive(Serialize)]
struct PhysicalLocation {
    #[serde(rename = "artifactLocation")]
    artifact_location: ArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
}

#[derive(Serialize, Clone)]
struct ArtifactLocation {
    uri: String,
}

#[derive(Serialize)]
struct Region {
    #[serde(rename = "startLine", skip_serializing_if = "Option::is_none")]
    start_line: Option<u64>,
    #[serde(rename = "startColumn", skip_serializing_if = "Option::is_none")]
    start_column: Option<u64>,
}

#[derive(Serialize)]
struct Artifact {
    location: ArtifactLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<ArtifactContent>,
}

#[derive(Serialize)]
struct ArtifactContent {
    text: String,
}
