use std::io::Write;

use reglet_types::ExecutionResult;

use crate::{FormatError, FormatOptions, Formatter};

/// Equivalent YAML with 2-space indent (`serde_yaml`'s default).
pub struct YamlFormatter;

impl YamlFormatter {
    pub fn new(_options: FormatOptions) -> Self {
        Self
    }
}

impl Formatter for YamlFormatter {
    fn format(&self, result: &ExecutionResult, writer: &mut dyn Write) -> Result<(), FormatError> {
        let text = serde_yaml::to_string(result)?;
        writer.write_all(text.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reglet_types::ExecutionId;

    #[test]
    fn output_is_parseable_yaml_with_execution_id_field() {
        let result = ExecutionResult {
            execution_id: ExecutionId::new(),
            profile_name: "baseline".into(),
            profile_version: "1".into(),
            runtime_version: "0.1.0".into(),
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            version: 0,
            controls: vec![],
            summary: None,
        };
        let fmt = YamlFormatter::new(FormatOptions::default());
        let mut buf = Vec::new();
        fmt.format(&result, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("execution_id:"));
        assert!(text.contains("profile_name: baseline"));
    }
}
