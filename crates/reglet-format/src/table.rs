use std::io::Write;

use comfy_table::{presets, Attribute, Cell, Color, Table};
use reglet_types::{ExecutionResult, Status};

use crate::{FormatError, FormatOptions, Formatter};

/// Human-readable summary. ASCII preset regardless of `color` so disabled
/// color still yields pure-ASCII output suitable for snapshot testing.
pub struct TableFormatter {
    color: bool,
}

impl TableFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { color: options.color }
    }
}

impl Formatter for TableFormatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError> {
        let mut table = Table::new();
        table.load_preset(presets::ASCII_FULL);
        table.set_header(["ID", "NAME", "STATUS", "SEVERITY", "DURATION_MS"]);

        for control in &result.controls {
            let severity = control.severity.map(|s| s.as_str()).unwrap_or("-");
            let mut status_cell = Cell::new(control.status.as_str());
            if self.color {
                status_cell = status_cell.fg(status_color(control.status)).add_attribute(Attribute::Bold);
            }
            table.add_row([
                Cell::new(&control.id),
                Cell::new(&control.name),
                status_cell,
                Cell::new(severity),
                Cell::new(control.duration_ms.to_string()),
            ]);
        }

        writeln!(writer, "{table}")?;

        if let Some(summary) = &result.summary {
            writeln!(
                writer,
                "total={} passed={} failed={} error={} skipped={}",
                summary.total_controls, summary.passed, summary.failed, summary.error, summary.skipped
            )?;
        }
        Ok(())
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Pass => Color::Green,
        Status::Fail | Status::Error => Color::Red,
        Status::Skipped => Color::Yellow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reglet_types::{ControlResult, ExecutionId, Summary};
    use std::collections::BTreeSet;

    fn result_with(controls: Vec<ControlResult>) -> ExecutionResult {
        let summary = Summary {
            total_controls: controls.len(),
            passed: controls.iter().filter(|c| c.status == Status::Pass).count(),
            failed: controls.iter().filter(|c| c.status == Status::Fail).count(),
            error: controls.iter().filter(|c| c.status == Status::Error).count(),
            skipped: controls.iter().filter(|c| c.status == Status::Skipped).count(),
            total_observations: 0,
        };
        ExecutionResult {
            execution_id: ExecutionId::new(),
            profile_name: "baseline".into(),
            profile_version: "1".into(),
            runtime_version: "0.1.0".into(),
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            version: 0,
            controls,
            summary: Some(summary),
        }
    }

    fn control(id: &str, status: Status) -> ControlResult {
        ControlResult {
            id: id.into(),
            name: format!("{id}-name"),
            description: String::new(),
            severity: None,
            tags: BTreeSet::new(),
            status,
            message: String::new(),
            skip_reason: None,
            index: 0,
            duration_ms: 12,
            observations: vec![],
        }
    }

    #[test]
    fn uncolored_output_is_pure_ascii() {
        let fmt = TableFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result_with(vec![control("c1", Status::Pass), control("c2", Status::Fail)]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.is_ascii());
        assert!(text.contains("c1"));
        assert!(text.contains("total=2 passed=1 failed=1 error=0 skipped=0"));
    }

    #[test]
    fn empty_controls_still_prints_summary_line() {
        let fmt = TableFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result_with(vec![]), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("total=0 passed=0 failed=0 error=0 skipped=0"));
    }
}
