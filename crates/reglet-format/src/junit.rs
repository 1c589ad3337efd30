use std::io::Write;

use reglet_types::{ControlResult, ExecutionResult, Status};

use crate::{FormatError, FormatOptions, Formatter};

/// Hand-assembled JUnit XML: one `testsuite` named after the profile, one
/// `testcase` per control. The document shape is small and fixed, so this
/// writes it directly rather than pulling in an XML crate.
pub struct JunitFormatter;

impl JunitFormatter {
    pub fn new(_options: FormatOptions) -> Self {
        Self
    }
}

impl Formatter for JunitFormatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError> {
        let summary = result.summary.clone().unwrap_or_default();
        let total_time = result.duration_ms.unwrap_or(0) as f64 / 1000.0;

        writeln!(writer, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            writer,
            r#"<testsuites tests="{}" failures="{}" errors="{}" skipped="{}" time="{:.3}">"#,
            summary.total_controls, summary.failed, summary.error, summary.skipped, total_time
        )?;
        writeln!(
            writer,
            r#"  <testsuite name="{}" tests="{}" failures="{}" errors="{}" skipped="{}" time="{:.3}">"#,
            escape(&result.profile_name),
            summary.total_controls,
            summary.failed,
            summary.error,
            summary.skipped,
            total_time
        )?;

        for control in &result.controls {
            write_testcase(writer, control)?;
        }

        writeln!(writer, "  </testsuite>")?;
        writeln!(writer, "</testsuites>")?;
        Ok(())
    }
}

fn write_testcase(writer: &mut dyn Write, control: &ControlResult) -> Result<(), FormatError> {
    let time = control.duration_ms as f64 / 1000.0;
    let open = format!(
        r#"    <testcase name="{}" classname="{}" time="{:.3}""#,
        escape(&control.id),
        escape(&control.name),
        time
    );

    match control.status {
        Status::Pass => writeln!(writer, "{open}/>")?,
        Status::Fail => {
            writeln!(writer, "{open}>")?;
            writeln!(writer, r#"      <failure message="{}">{}</failure>"#, escape(&control.message), escape(&control.message))?;
            writeln!(writer, "    </testcase>")?;
        }
        Status::Error => {
            writeln!(writer, "{open}>")?;
            writeln!(writer, r#"      <error message="{}">{}</error>"#, escape(&control.message), escape(&control.message))?;
            writeln!(writer, "    </testcase>")?;
        }
        Status::Skipped => {
            writeln!(writer, "{open}>")?;
            writeln!(writer, r#"      <skipped message="{}"/>"#, escape(control.skip_reason.as_deref().unwrap_or("")))?;
            writeln!(writer, "    </testcase>")?;
        }
    }
    Ok(())
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reglet_types::{ExecutionId, Summary};
    use std::collections::BTreeSet;

    fn control(id: &str, status: Status) -> ControlResult {
        ControlResult {
            id: id.into(),
            name: format!("{id}-name"),
            description: String::new(),
            severity: None,
            tags: BTreeSet::new(),
            status,
            message: "details".into(),
            skip_reason: if status == Status::Skipped { Some("canceled".into()) } else { None },
            index: 0,
            duration_ms: 250,
            observations: vec![],
        }
    }

    fn result(controls: Vec<ControlResult>) -> ExecutionResult {
        ExecutionResult {
            execution_id: ExecutionId::new(),
            profile_name: "baseline".into(),
            profile_version: "1".into(),
            runtime_version: "0.1.0".into(),
            start_time: Utc::now(),
            end_time: None,
            duration_ms: Some(500),
            version: 0,
            controls,
            summary: Some(Summary { total_controls: 1, passed: 0, failed: 1, error: 0, skipped: 0, total_observations: 0 }),
        }
    }

    #[test]
    fn failed_control_emits_failure_element() {
        let fmt = JunitFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result(vec![control("c1", Status::Fail)]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("<failure message=\"details\">details</failure>"));
    }

    #[test]
    fn passed_control_has_no_child_element() {
        let fmt = JunitFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result(vec![control("c1", Status::Pass)]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"<testcase name="c1" classname="c1-name" time="0.250"/>"#));
    }

    #[test]
    fn skipped_control_emits_skip_reason() {
        let fmt = JunitFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result(vec![control("c1", Status::Skipped)]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"<skipped message="canceled"/>"#));
    }

    #[test]
    fn top_level_testsuites_carries_aggregate_counts() {
        let fmt = JunitFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result(vec![control("c1", Status::Fail)]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains(r#"<testsuites tests="1" failures="1" errors="0" skipped="0""#));
    }
}
